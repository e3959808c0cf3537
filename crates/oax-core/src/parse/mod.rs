pub mod components;
pub mod example;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod reference;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod security;
pub mod server;
pub mod spec;

use std::fs;
use std::path::Path;

use crate::error::ParseError;
use spec::Document;

pub use reference::RefOr;

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<Document, ParseError> {
    let document: Document = serde_yaml_ng::from_str(input)?;
    validate_version(&document)?;
    Ok(document)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<Document, ParseError> {
    let document: Document = serde_json::from_str(input)?;
    validate_version(&document)?;
    Ok(document)
}

/// Read and parse a document from disk. `.json` files are parsed as JSON,
/// anything else as YAML.
pub fn from_path(path: &Path) -> Result<Document, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("loaded {} ({} bytes)", path.display(), content.len());

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => from_json(&content),
        _ => from_yaml(&content),
    }
}

fn validate_version(document: &Document) -> Result<(), ParseError> {
    if !document.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(document.openapi.clone()));
    }
    Ok(())
}
