use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::LookupError;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::spec::Document;

pub use crate::parse::operation::HttpMethod;

/// Group key for endpoints that declare no tags.
pub const UNTAGGED: &str = "untagged";

/// One operation of a document, denormalized with its location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub operation: &'a Operation,
    pub path_item: &'a PathItem,
}

impl<'a> Endpoint<'a> {
    /// Identity within one document: `method:path`, method lower-cased.
    pub fn key(&self) -> String {
        endpoint_key(self.method, self.path)
    }

    /// Deep-link fragment: the method followed by the path without braces.
    /// `get` + `/pets/{id}` gives `get/pets/id`.
    pub fn fragment(&self) -> String {
        let path: String = self.path.chars().filter(|c| !matches!(c, '{' | '}')).collect();
        format!("{}{}", self.method.as_str(), path)
    }

    pub fn primary_tag(&self) -> Option<&'a str> {
        self.operation.primary_tag()
    }

    pub fn summary(&self) -> Option<&'a str> {
        self.operation.summary.as_deref()
    }

    pub fn to_summary(&self) -> EndpointSummary {
        EndpointSummary {
            method: self.method,
            path: self.path.to_string(),
            summary: self.operation.summary.clone(),
            operation_id: self.operation.operation_id.clone(),
            tags: self.operation.tags.clone(),
            deprecated: self.operation.is_deprecated(),
        }
    }
}

/// Owned, serializable view of an endpoint for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSummary {
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

pub fn endpoint_key(method: HttpMethod, path: &str) -> String {
    format!("{}:{}", method.as_str(), path)
}

/// Every operation under `paths`, in document order and canonical method
/// order within each path item.
pub fn extract_endpoints(document: &Document) -> Vec<Endpoint<'_>> {
    flatten(&document.paths)
}

/// Every operation under `webhooks`. The webhook name stands in for the path.
pub fn extract_webhooks(document: &Document) -> Vec<Endpoint<'_>> {
    flatten(&document.webhooks)
}

fn flatten(items: &IndexMap<String, PathItem>) -> Vec<Endpoint<'_>> {
    items
        .iter()
        .flat_map(|(path, item)| {
            item.operations().map(move |(method, operation)| Endpoint {
                path: path.as_str(),
                method,
                operation,
                path_item: item,
            })
        })
        .collect()
}

/// Group by primary tag. Groups keep first-seen order; endpoints without
/// tags land under [`UNTAGGED`], which always comes last.
pub fn group_by_tag<'a>(endpoints: &[Endpoint<'a>]) -> IndexMap<String, Vec<Endpoint<'a>>> {
    let mut groups: IndexMap<String, Vec<Endpoint<'a>>> = IndexMap::new();
    let mut untagged = Vec::new();

    for endpoint in endpoints {
        match endpoint.primary_tag() {
            Some(tag) => groups.entry(tag.to_string()).or_default().push(*endpoint),
            None => untagged.push(*endpoint),
        }
    }

    if !untagged.is_empty() {
        // A real tag literally named "untagged" shares the bucket.
        let mut bucket = groups.shift_remove(UNTAGGED).unwrap_or_default();
        bucket.extend(untagged);
        groups.insert(UNTAGGED.to_string(), bucket);
    }

    groups
}

/// Sorted, de-duplicated union of declared tags and tags used by path or
/// webhook operations.
pub fn all_tags(document: &Document) -> Vec<String> {
    let declared = document.tags.iter().map(|t| t.name.as_str());
    let used = extract_endpoints(document)
        .into_iter()
        .chain(extract_webhooks(document))
        .flat_map(|e| e.operation.tags.iter().map(String::as_str));

    declared
        .chain(used)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Case-insensitive search over path, method, summary, and operationId.
pub fn filter_endpoints<'a>(endpoints: &[Endpoint<'a>], query: &str) -> Vec<Endpoint<'a>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return endpoints.to_vec();
    }

    endpoints
        .iter()
        .filter(|e| {
            let haystacks = [
                Some(e.path),
                Some(e.method.as_str()),
                e.operation.summary.as_deref(),
                e.operation.operation_id.as_deref(),
            ];
            haystacks
                .into_iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle))
        })
        .copied()
        .collect()
}

/// Find an endpoint by its `method:path` key.
pub fn find_endpoint<'a>(document: &'a Document, key: &str) -> Result<Endpoint<'a>, LookupError> {
    let (method, path) = key
        .split_once(':')
        .ok_or_else(|| LookupError::InvalidEndpointKey(key.to_string()))?;
    let method: HttpMethod = method.parse()?;

    let (path, path_item) = document
        .paths
        .get_key_value(path)
        .ok_or_else(|| LookupError::EndpointNotFound(key.to_string()))?;
    let operation = path_item
        .operation(method)
        .ok_or_else(|| LookupError::EndpointNotFound(key.to_string()))?;

    Ok(Endpoint {
        path: path.as_str(),
        method,
        operation,
        path_item,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::spec::Tag;

    fn tagged(tags: &[&str]) -> Operation {
        Operation {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn document() -> Document {
        let mut doc = Document {
            openapi: "3.0.3".into(),
            tags: vec![Tag {
                name: "zoo".into(),
                description: None,
            }],
            ..Default::default()
        };
        doc.paths.insert(
            "/pets/{id}".into(),
            PathItem {
                get: Some(Operation {
                    summary: Some("Fetch a pet".into()),
                    operation_id: Some("getPet".into()),
                    ..tagged(&["pets", "animals"])
                }),
                delete: Some(tagged(&[])),
                ..Default::default()
            },
        );
        doc.paths.insert(
            "/health".into(),
            PathItem {
                get: Some(tagged(&[])),
                ..Default::default()
            },
        );
        doc.paths.insert(
            "/owners".into(),
            PathItem {
                post: Some(tagged(&["owners"])),
                ..Default::default()
            },
        );
        doc
    }

    #[test]
    fn test_key_and_fragment() {
        let doc = document();
        let endpoints = extract_endpoints(&doc);
        assert_eq!(endpoints[0].key(), "get:/pets/{id}");
        assert_eq!(endpoints[0].fragment(), "get/pets/id");
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let doc = document();
        let keys: Vec<String> = extract_endpoints(&doc).iter().map(Endpoint::key).collect();
        assert_eq!(
            keys,
            vec![
                "get:/pets/{id}",
                "delete:/pets/{id}",
                "get:/health",
                "post:/owners"
            ]
        );
    }

    #[test]
    fn test_group_by_primary_tag_untagged_last() {
        let doc = document();
        let endpoints = extract_endpoints(&doc);
        let groups = group_by_tag(&endpoints);

        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["pets", "owners", UNTAGGED]);
        assert_eq!(groups[UNTAGGED].len(), 2);
        assert!(!groups.contains_key("animals"));
    }

    #[test]
    fn test_all_tags_sorted_union() {
        let doc = document();
        assert_eq!(all_tags(&doc), vec!["animals", "owners", "pets", "zoo"]);
    }

    #[test]
    fn test_filter_endpoints() {
        let doc = document();
        let endpoints = extract_endpoints(&doc);
        let hits = filter_endpoints(&endpoints, "GETPET");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "/pets/{id}");
        assert_eq!(filter_endpoints(&endpoints, "delete").len(), 1);
        assert_eq!(filter_endpoints(&endpoints, "  ").len(), 4);
    }

    #[test]
    fn test_find_endpoint() {
        let doc = document();
        let endpoint = find_endpoint(&doc, "GET:/pets/{id}").unwrap();
        assert_eq!(endpoint.operation.operation_id.as_deref(), Some("getPet"));
        assert_eq!(
            find_endpoint(&doc, "put:/pets/{id}").unwrap_err(),
            LookupError::EndpointNotFound("put:/pets/{id}".into())
        );
        assert!(matches!(
            find_endpoint(&doc, "/pets"),
            Err(LookupError::InvalidEndpointKey(_))
        ));
    }
}
