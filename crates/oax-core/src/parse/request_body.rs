use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::media_type::MediaType;

/// A request body definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

impl RequestBody {
    /// The preferred media type: `application/json` when declared, otherwise
    /// the first entry in document order.
    pub fn preferred_content(&self) -> Option<(&str, &MediaType)> {
        super::media_type::preferred(&self.content)
    }
}
