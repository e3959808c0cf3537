use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::example::Example;
use super::reference::RefOr;
use super::schema::Schema;

const JSON_MEDIA_TYPE: &str = "application/json";

/// A media type entry of a request body or response `content` map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<RefOr<Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
}

/// Pick `application/json` from a content map, falling back to the first
/// declared media type.
pub(crate) fn preferred(content: &IndexMap<String, MediaType>) -> Option<(&str, &MediaType)> {
    content
        .get_key_value(JSON_MEDIA_TYPE)
        .or_else(|| content.first())
        .map(|(k, v)| (k.as_str(), v))
}
