mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use oax_core::config::{self, CONFIG_FILE_NAME, OaxConfig, OutputFormat};
use oax_core::endpoint::{
    Endpoint, EndpointSummary, extract_webhooks, filter_endpoints, find_endpoint,
};
use oax_core::error::LookupError;
use oax_core::parse::schema::SchemaOrRef;
use oax_core::request::RequestShape;
use oax_core::{
    DiffResult, Document, ExampleGenerator, RefResolver, TypeProjector, all_tags, diff,
    extract_endpoints, group_by_tag, parse,
};

#[derive(Parser)]
#[command(name = "oax", about = "OpenAPI 3.x document explorer", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an OpenAPI document and check its references
    Validate {
        /// Path to the OpenAPI document (YAML or JSON)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List endpoints
    Endpoints {
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Group by primary tag
        #[arg(long)]
        group: bool,

        /// Case-insensitive search over path, method, summary, and operationId
        #[arg(long)]
        filter: Option<String>,

        /// List webhooks instead of paths
        #[arg(long)]
        webhooks: bool,

        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// List tags
    Tags {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Generate an example instance for a schema or an operation payload
    Example {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        target: Target,

        /// Response status code; without it the request body is used
        #[arg(long, requires = "operation")]
        status: Option<String>,

        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Show the structural type of a schema or an operation payload
    Types {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        target: Target,

        /// Response status code; without it the request body is used
        #[arg(long, requires = "operation")]
        status: Option<String>,

        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Build an example request for an operation
    Request {
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Endpoint as METHOD:PATH, e.g. get:/pets/{id}
        #[arg(long)]
        operation: String,

        /// Base URL; defaults to the document's first server
        #[arg(long)]
        server: Option<String>,

        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Compare the endpoints of two documents
    Diff {
        #[arg(long)]
        old: PathBuf,

        #[arg(long)]
        new: PathBuf,

        #[arg(long)]
        format: Option<FormatArg>,

        /// Exit with status 1 when any change is found
        #[arg(long)]
        fail_on_changes: bool,
    },

    /// Initialize a new oax configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// What `example` and `types` operate on.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Component schema name
    #[arg(long)]
    schema: Option<String>,

    /// Endpoint as METHOD:PATH, e.g. post:/pets
    #[arg(long)]
    operation: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => OaxConfig::default(),
        _ => try_load_config()?.unwrap_or_default(),
    };

    match cli.command {
        Commands::Validate { input } => cmd_validate(&input_path(input, &cfg))?,

        Commands::Endpoints {
            input,
            group,
            filter,
            webhooks,
            format,
        } => cmd_endpoints(
            &input_path(input, &cfg),
            group,
            filter.as_deref(),
            webhooks,
            pick_format(format, &cfg),
        )?,

        Commands::Tags { input, format } => {
            cmd_tags(&input_path(input, &cfg), pick_format(format, &cfg))?
        }

        Commands::Example {
            input,
            target,
            status,
            format,
        } => cmd_example(
            &input_path(input, &cfg),
            &target,
            status.as_deref(),
            pick_format(format, &cfg),
            &cfg,
        )?,

        Commands::Types {
            input,
            target,
            status,
            format,
        } => cmd_types(
            &input_path(input, &cfg),
            &target,
            status.as_deref(),
            pick_format(format, &cfg),
            &cfg,
        )?,

        Commands::Request {
            input,
            operation,
            server,
            format,
        } => cmd_request(
            &input_path(input, &cfg),
            &operation,
            server.as_deref(),
            pick_format(format, &cfg),
            &cfg,
        )?,

        Commands::Diff {
            old,
            new,
            format,
            fail_on_changes,
        } => {
            return cmd_diff(
                &old,
                &new,
                pick_format(format, &cfg),
                fail_on_changes || cfg.diff.fail_on_changes,
            );
        }

        Commands::Init { force } => cmd_init(force)?,

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oax", &mut std::io::stdout());
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<OaxConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    let cfg = config::load_config(&config_path)?;
    if cfg.is_some() {
        log::debug!("loaded {}", config_path.display());
    }
    Ok(cfg)
}

fn input_path(input: Option<PathBuf>, cfg: &OaxConfig) -> PathBuf {
    input.unwrap_or_else(|| PathBuf::from(&cfg.input))
}

fn pick_format(arg: Option<FormatArg>, cfg: &OaxConfig) -> OutputFormat {
    arg.map(OutputFormat::from).unwrap_or(cfg.format)
}

fn load_document(path: &Path) -> Result<Document> {
    parse::from_path(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Print structured output. `Text` falls back to pretty JSON for commands
/// without a dedicated text rendering.
fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(value)?),
        OutputFormat::Json | OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value)?)
        }
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let doc = load_document(input)?;
    let resolver = RefResolver::new(&doc);

    eprintln!("Valid OpenAPI {} document: {}", doc.openapi, doc.info.title);
    eprintln!("  Version: {}", doc.info.version);
    eprintln!("  Paths: {}", doc.paths.len());
    eprintln!("  Endpoints: {}", extract_endpoints(&doc).len());
    if !doc.webhooks.is_empty() {
        eprintln!("  Webhooks: {}", extract_webhooks(&doc).len());
    }
    if let Some(ref components) = doc.components {
        eprintln!("  Schemas: {}", components.schemas.len());
    }
    eprintln!("  Tags: {}", all_tags(&doc).len());

    let broken = resolver.broken_references();
    if !broken.is_empty() {
        for error in &broken {
            eprintln!("  error: {error}");
        }
        anyhow::bail!("{} unresolved reference(s) in {}", broken.len(), input.display());
    }

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_endpoints(
    input: &Path,
    group: bool,
    filter: Option<&str>,
    webhooks: bool,
    format: OutputFormat,
) -> Result<()> {
    let doc = load_document(input)?;
    let mut endpoints = if webhooks {
        extract_webhooks(&doc)
    } else {
        extract_endpoints(&doc)
    };
    if let Some(query) = filter {
        endpoints = filter_endpoints(&endpoints, query);
    }
    log::debug!("{} endpoint(s) after filtering", endpoints.len());

    if group {
        let groups = group_by_tag(&endpoints);
        if let OutputFormat::Text = format {
            for (tag, members) in &groups {
                println!("{tag}:");
                for endpoint in members {
                    println!("  {}", endpoint_line(endpoint));
                }
            }
            return Ok(());
        }
        let summaries: IndexMap<&str, Vec<EndpointSummary>> = groups
            .iter()
            .map(|(tag, members)| {
                (
                    tag.as_str(),
                    members.iter().map(Endpoint::to_summary).collect(),
                )
            })
            .collect();
        return print_value(&summaries, format);
    }

    if let OutputFormat::Text = format {
        for endpoint in &endpoints {
            println!("{}", endpoint_line(endpoint));
        }
        return Ok(());
    }
    let summaries: Vec<EndpointSummary> = endpoints.iter().map(Endpoint::to_summary).collect();
    print_value(&summaries, format)
}

fn endpoint_line(endpoint: &Endpoint<'_>) -> String {
    let method = endpoint.method.as_str().to_uppercase();
    let mut line = format!("{method:<7} {}", endpoint.path);
    if let Some(summary) = endpoint.summary() {
        line.push_str("  ");
        line.push_str(summary);
    }
    if endpoint.operation.is_deprecated() {
        line.push_str(" (deprecated)");
    }
    line
}

fn cmd_tags(input: &Path, format: OutputFormat) -> Result<()> {
    let doc = load_document(input)?;
    let tags = all_tags(&doc);
    match format {
        OutputFormat::Text => {
            for tag in &tags {
                println!("{tag}");
            }
            Ok(())
        }
        _ => print_value(&tags, format),
    }
}

/// The schema node `example` and `types` operate on.
fn target_schema<'a>(
    doc: &'a Document,
    resolver: RefResolver<'a>,
    target: &Target,
    status: Option<&str>,
) -> Result<&'a SchemaOrRef> {
    if let Some(ref name) = target.schema {
        let node = doc
            .components
            .as_ref()
            .and_then(|c| c.schemas.get(name))
            .ok_or_else(|| LookupError::SchemaNotFound(name.clone()))?;
        resolver.resolve_strict(node)?;
        return Ok(node);
    }

    let key = target
        .operation
        .as_deref()
        .context("either --schema or --operation is required")?;
    let endpoint = find_endpoint(doc, key)?;

    let media_type = match status {
        Some(code) => {
            let node = endpoint
                .operation
                .responses
                .get(code)
                .with_context(|| format!("{key} has no response {code}"))?;
            resolver.resolve_strict(node)?.preferred_content()
        }
        None => {
            let node = endpoint
                .operation
                .request_body
                .as_ref()
                .with_context(|| {
                    format!("{key} has no request body; pass --status for a response")
                })?;
            resolver.resolve_strict(node)?.preferred_content()
        }
    };

    let (content_type, media_type) =
        media_type.with_context(|| format!("{key} declares no content"))?;
    log::debug!("using {content_type} payload of {key}");
    let node = media_type
        .schema
        .as_ref()
        .with_context(|| format!("{content_type} payload of {key} has no schema"))?;
    resolver.resolve_strict(node)?;
    Ok(node)
}

fn cmd_example(
    input: &Path,
    target: &Target,
    status: Option<&str>,
    format: OutputFormat,
    cfg: &OaxConfig,
) -> Result<()> {
    let doc = load_document(input)?;
    let resolver = RefResolver::new(&doc);
    let generator = ExampleGenerator::new(resolver).with_max_depth(cfg.examples.max_depth);

    let example = match (&target.operation, status) {
        (Some(key), Some(code)) => {
            let endpoint = find_endpoint(&doc, key)?;
            generator.response_example(endpoint.operation, code)
        }
        (Some(key), None) => {
            let endpoint = find_endpoint(&doc, key)?;
            generator.request_body_example(endpoint.operation)
        }
        (None, _) => {
            let node = target_schema(&doc, resolver, target, None)?;
            generator.example(node, 0)
        }
    };

    let Some(mut example) = example else {
        // Surface the reason, e.g. an unresolvable reference.
        target_schema(&doc, resolver, target, status)?;
        anyhow::bail!("no example could be generated");
    };
    if cfg.examples.skip_null_fields {
        strip_null_fields(&mut example);
    }
    print_value(&example, format)
}

/// Recursively remove `null`-valued object properties.
fn strip_null_fields(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            fields.retain(|_, v| !v.is_null());
            fields.values_mut().for_each(strip_null_fields);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_null_fields),
        _ => {}
    }
}

fn cmd_types(
    input: &Path,
    target: &Target,
    status: Option<&str>,
    format: OutputFormat,
    cfg: &OaxConfig,
) -> Result<()> {
    let doc = load_document(input)?;
    let resolver = RefResolver::new(&doc);
    let projector = TypeProjector::new(resolver).with_max_depth(cfg.examples.max_depth);

    let node = target_schema(&doc, resolver, target, status)?;
    let shape = projector.type_shape(node, 0);
    match format {
        OutputFormat::Text => {
            println!("{shape}");
            Ok(())
        }
        _ => print_value(&shape, format),
    }
}

fn cmd_request(
    input: &Path,
    operation: &str,
    server: Option<&str>,
    format: OutputFormat,
    cfg: &OaxConfig,
) -> Result<()> {
    let doc = load_document(input)?;
    let resolver = RefResolver::new(&doc);
    let generator = ExampleGenerator::new(resolver).with_max_depth(cfg.examples.max_depth);
    let endpoint = find_endpoint(&doc, operation)?;

    let shape = RequestShape::build(&endpoint, &generator, resolver, server);
    match format {
        OutputFormat::Text => {
            print!("{}", request_text(&shape)?);
            Ok(())
        }
        _ => print_value(&shape, format),
    }
}

/// HTTP-style rendering: request line, headers, blank line, body.
fn request_text(shape: &RequestShape) -> Result<String> {
    let mut url = shape.url.clone();
    if !shape.query.is_empty() {
        let query: Vec<String> = shape.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }

    let mut out = format!("{} {url}\n", shape.method.as_str().to_uppercase());
    for (name, value) in &shape.headers {
        out.push_str(&format!("{name}: {value}\n"));
    }
    if !shape.cookies.is_empty() {
        let cookies: Vec<String> = shape.cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(&format!("Cookie: {}\n", cookies.join("; ")));
    }
    if let Some(ref content_type) = shape.content_type {
        out.push_str(&format!("Content-Type: {content_type}\n"));
    }
    if let Some(ref body) = shape.body {
        out.push('\n');
        out.push_str(&serde_json::to_string_pretty(body)?);
        out.push('\n');
    }
    Ok(out)
}

fn cmd_diff(
    old: &Path,
    new: &Path,
    format: OutputFormat,
    fail_on_changes: bool,
) -> Result<ExitCode> {
    let old_doc = load_document(old)?;
    let new_doc = load_document(new)?;
    let result = diff(&old_doc, &new_doc);

    match format {
        OutputFormat::Text => {
            let text = report::render_diff(
                &old.display().to_string(),
                &new.display().to_string(),
                &result,
            )
            .context("failed to render diff report")?;
            println!("{text}");
        }
        _ => print_value(&result, format)?,
    }

    if fails_on_changes(&result, fail_on_changes) {
        eprintln!("Endpoint changes detected.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn fails_on_changes(result: &DiffResult, fail_on_changes: bool) -> bool {
    fail_on_changes && result.has_changes()
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
