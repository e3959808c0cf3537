use minijinja::{Environment, context};
use oax_core::DiffResult;

const DIFF_TEMPLATE: &str = "diff.txt";

/// Render a diff as the plain-text report printed by `oax diff --format text`.
pub fn render_diff(
    old_name: &str,
    new_name: &str,
    result: &DiffResult,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template(DIFF_TEMPLATE, include_str!("../templates/diff.txt.j2"))?;
    let tmpl = env.get_template(DIFF_TEMPLATE)?;

    tmpl.render(context! {
        old_name => old_name,
        new_name => new_name,
        has_changes => result.has_changes(),
        added => &result.added,
        removed => &result.removed,
        modified => &result.modified,
        summary => &result.summary,
    })
}
