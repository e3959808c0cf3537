use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::endpoint::{Endpoint, HttpMethod, extract_endpoints};
use crate::parse::operation::Operation;
use crate::parse::security::SecurityRequirement;
use crate::parse::spec::Document;

/// An endpoint present in only one of the two documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointChange {
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// An endpoint present in both documents whose operation differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedEndpoint {
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub total_added: usize,
    pub total_removed: usize,
    pub total_modified: usize,
    pub old_endpoint_count: usize,
    pub new_endpoint_count: usize,
}

/// Endpoint-level delta between two documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DiffResult {
    pub added: Vec<EndpointChange>,
    pub removed: Vec<EndpointChange>,
    pub modified: Vec<ModifiedEndpoint>,
    pub summary: DiffSummary,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty())
    }
}

/// Compare the endpoints of two documents.
///
/// Added entries follow the new document's order; removed and modified
/// entries follow the old document's order.
pub fn diff(old: &Document, new: &Document) -> DiffResult {
    let old_index = index_endpoints(old);
    let new_index = index_endpoints(new);

    let added: Vec<EndpointChange> = new_index
        .iter()
        .filter(|(key, _)| !old_index.contains_key(*key))
        .map(|(_, e)| change_of(e))
        .collect();

    let removed: Vec<EndpointChange> = old_index
        .iter()
        .filter(|(key, _)| !new_index.contains_key(*key))
        .map(|(_, e)| change_of(e))
        .collect();

    let modified: Vec<ModifiedEndpoint> = old_index
        .iter()
        .filter_map(|(key, before)| {
            let after = new_index.get(key)?;
            let changes = compare_operations(before.operation, after.operation);
            if changes.is_empty() {
                return None;
            }
            Some(ModifiedEndpoint {
                method: after.method,
                path: after.path.to_string(),
                summary: after
                    .operation
                    .summary
                    .clone()
                    .or_else(|| before.operation.summary.clone()),
                changes,
            })
        })
        .collect();

    log::debug!(
        "diff: {} added, {} removed, {} modified",
        added.len(),
        removed.len(),
        modified.len()
    );

    let summary = DiffSummary {
        total_added: added.len(),
        total_removed: removed.len(),
        total_modified: modified.len(),
        old_endpoint_count: old_index.len(),
        new_endpoint_count: new_index.len(),
    };

    DiffResult {
        added,
        removed,
        modified,
        summary,
    }
}

fn index_endpoints(document: &Document) -> IndexMap<String, Endpoint<'_>> {
    extract_endpoints(document)
        .into_iter()
        .map(|e| (e.key(), e))
        .collect()
}

fn change_of(endpoint: &Endpoint<'_>) -> EndpointChange {
    EndpointChange {
        method: endpoint.method,
        path: endpoint.path.to_string(),
        summary: endpoint.operation.summary.clone(),
    }
}

/// One note per differing field, in a fixed order.
pub fn compare_operations(old: &Operation, new: &Operation) -> Vec<String> {
    let mut changes = Vec::new();

    if old.summary != new.summary {
        changes.push("Summary changed".to_string());
    }
    if old.description != new.description {
        changes.push("Description changed".to_string());
    }

    match (old.is_deprecated(), new.is_deprecated()) {
        (false, true) => changes.push("Marked as deprecated".to_string()),
        (true, false) => changes.push("No longer deprecated".to_string()),
        _ => {}
    }

    if old.operation_id != new.operation_id {
        changes.push(format!(
            "Operation ID changed: {} -> {}",
            old.operation_id.as_deref().unwrap_or("(none)"),
            new.operation_id.as_deref().unwrap_or("(none)")
        ));
    }

    if old.parameters.len() != new.parameters.len() {
        changes.push(format!(
            "Parameter count changed: {} -> {}",
            old.parameters.len(),
            new.parameters.len()
        ));
    }

    match (old.request_body.is_some(), new.request_body.is_some()) {
        (false, true) => changes.push("Request body added".to_string()),
        (true, false) => changes.push("Request body removed".to_string()),
        _ => {}
    }

    let old_codes: BTreeSet<&str> = old.responses.keys().map(String::as_str).collect();
    let new_codes: BTreeSet<&str> = new.responses.keys().map(String::as_str).collect();
    let added_codes: Vec<&str> = new_codes.difference(&old_codes).copied().collect();
    let removed_codes: Vec<&str> = old_codes.difference(&new_codes).copied().collect();
    if !added_codes.is_empty() {
        changes.push(format!("Response codes added: {}", added_codes.join(", ")));
    }
    if !removed_codes.is_empty() {
        changes.push(format!("Response codes removed: {}", removed_codes.join(", ")));
    }

    let old_tags = sorted_joined(&old.tags);
    let new_tags = sorted_joined(&new.tags);
    if old_tags != new_tags {
        changes.push(format!("Tags changed: {old_tags} -> {new_tags}"));
    }

    if canonical_security(old.security.as_deref()) != canonical_security(new.security.as_deref()) {
        changes.push("Security requirements changed".to_string());
    }

    changes
}

fn sorted_joined(tags: &[String]) -> String {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(", ")
}

type CanonicalRequirement<'a> = BTreeMap<&'a str, &'a [String]>;

/// Requirement lists with scheme keys sorted, so key order in the source
/// document does not register as a change. `None` stays distinct from an
/// explicit empty list.
fn canonical_security(
    security: Option<&[SecurityRequirement]>,
) -> Option<Vec<CanonicalRequirement<'_>>> {
    security.map(|reqs| {
        reqs.iter()
            .map(|req| {
                req.iter()
                    .map(|(scheme, scopes)| (scheme.as_str(), scopes.as_slice()))
                    .collect()
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::reference::RefOr;
    use crate::parse::request_body::RequestBody;
    use crate::parse::response::Response;

    fn respond(codes: &[&str]) -> IndexMap<String, RefOr<Response>> {
        codes
            .iter()
            .map(|c| (c.to_string(), RefOr::Item(Response::default())))
            .collect()
    }

    #[test]
    fn test_identical_operations_have_no_changes() {
        let op = Operation {
            summary: Some("List".into()),
            responses: respond(&["200"]),
            ..Default::default()
        };
        assert!(compare_operations(&op, &op.clone()).is_empty());
    }

    #[test]
    fn test_deprecation_direction() {
        let plain = Operation::default();
        let deprecated = Operation {
            deprecated: Some(true),
            ..Default::default()
        };
        let explicit_false = Operation {
            deprecated: Some(false),
            ..Default::default()
        };
        assert_eq!(
            compare_operations(&plain, &deprecated),
            vec!["Marked as deprecated"]
        );
        assert_eq!(
            compare_operations(&deprecated, &plain),
            vec!["No longer deprecated"]
        );
        assert!(compare_operations(&plain, &explicit_false).is_empty());
    }

    #[test]
    fn test_response_codes_and_body() {
        let old = Operation {
            responses: respond(&["500", "200"]),
            ..Default::default()
        };
        let new = Operation {
            responses: respond(&["201", "200", "404"]),
            request_body: Some(RefOr::Item(RequestBody::default())),
            ..Default::default()
        };
        assert_eq!(
            compare_operations(&old, &new),
            vec![
                "Request body added",
                "Response codes added: 201, 404",
                "Response codes removed: 500",
            ]
        );
    }

    #[test]
    fn test_response_code_order_is_ignored() {
        let old = Operation {
            responses: respond(&["404", "200"]),
            ..Default::default()
        };
        let new = Operation {
            responses: respond(&["200", "404"]),
            ..Default::default()
        };
        assert!(compare_operations(&old, &new).is_empty());
    }

    #[test]
    fn test_tags_order_insensitive() {
        let old = Operation {
            tags: vec!["b".into(), "a".into()],
            ..Default::default()
        };
        let reordered = Operation {
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let changed = Operation {
            tags: vec!["a".into()],
            ..Default::default()
        };
        assert!(compare_operations(&old, &reordered).is_empty());
        assert_eq!(
            compare_operations(&old, &changed),
            vec!["Tags changed: a, b -> a"]
        );
    }

    #[test]
    fn test_security_canonical_comparison() {
        let mut first = SecurityRequirement::new();
        first.insert("oauth".into(), vec!["read".into()]);
        first.insert("apiKey".into(), vec![]);
        let mut swapped = SecurityRequirement::new();
        swapped.insert("apiKey".into(), vec![]);
        swapped.insert("oauth".into(), vec!["read".into()]);

        let old = Operation {
            security: Some(vec![first]),
            ..Default::default()
        };
        let same = Operation {
            security: Some(vec![swapped]),
            ..Default::default()
        };
        let unset = Operation::default();
        let empty = Operation {
            security: Some(vec![]),
            ..Default::default()
        };

        assert!(compare_operations(&old, &same).is_empty());
        assert_eq!(
            compare_operations(&old, &unset),
            vec!["Security requirements changed"]
        );
        assert_eq!(
            compare_operations(&unset, &empty),
            vec!["Security requirements changed"]
        );
    }

    #[test]
    fn test_operation_id_and_parameter_count() {
        let old = Operation {
            operation_id: Some("listPets".into()),
            ..Default::default()
        };
        let new = Operation {
            parameters: vec![RefOr::reference("#/components/parameters/Limit")],
            ..Default::default()
        };
        assert_eq!(
            compare_operations(&old, &new),
            vec![
                "Operation ID changed: listPets -> (none)",
                "Parameter count changed: 0 -> 1",
            ]
        );
    }
}
