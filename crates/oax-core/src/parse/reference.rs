use serde::{Deserialize, Serialize};

/// Either a `$ref` pointer into `components` or an inline object.
///
/// Every referencable OpenAPI object (schemas, parameters, request bodies,
/// responses, examples, security schemes) is stored behind this wrapper.
/// Pointers are kept verbatim; resolution is the job of
/// [`RefResolver`](crate::resolve::RefResolver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Item(T),
}

impl<T> RefOr<T> {
    /// Build a reference node from a pointer string.
    pub fn reference(ref_path: impl Into<String>) -> Self {
        RefOr::Ref {
            ref_path: ref_path.into(),
        }
    }

    /// The pointer, when this node is a reference.
    pub fn ref_path(&self) -> Option<&str> {
        match self {
            RefOr::Ref { ref_path } => Some(ref_path),
            RefOr::Item(_) => None,
        }
    }

    /// The inline object, when this node is not a reference.
    pub fn as_item(&self) -> Option<&T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Ref { .. } => None,
        }
    }
}

impl<T> From<T> for RefOr<T> {
    fn from(item: T) -> Self {
        RefOr::Item(item)
    }
}
