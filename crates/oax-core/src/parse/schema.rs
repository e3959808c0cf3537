use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::reference::RefOr;

/// A JSON Schema `type` keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }
}

/// `type` is either a single keyword or (OpenAPI 3.1) a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

/// A schema node as stored in the document: `$ref` or inline.
pub type SchemaOrRef = RefOr<Schema>;

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// A JSON Schema object restricted to the keywords the engine reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<serde_json::Value>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(rename = "writeOnly", skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaOrRef>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaOrRef>,

    // Validation facets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    /// OpenAPI 3.1 `examples`: a list of instances. Some documents use a map
    /// here instead, so the raw value is kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<serde_json::Value>,
}

/// How a schema combines sub-schemas. Composition keywords take precedence
/// over `type` when both are present; `oneOf` wins over `anyOf`, which wins
/// over `allOf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Composition<'a> {
    Plain,
    AllOf(&'a [SchemaOrRef]),
    OneOf(&'a [SchemaOrRef]),
    AnyOf(&'a [SchemaOrRef]),
}

impl Composition<'_> {
    /// The keyword as written in documents, `None` for plain schemas.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Composition::Plain => None,
            Composition::AllOf(_) => Some("allOf"),
            Composition::OneOf(_) => Some("oneOf"),
            Composition::AnyOf(_) => Some("anyOf"),
        }
    }
}

impl Schema {
    /// Shorthand for a schema with just a `type`.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Schema {
            schema_type: Some(TypeSet::Single(schema_type)),
            ..Default::default()
        }
    }

    pub fn composition(&self) -> Composition<'_> {
        if !self.one_of.is_empty() {
            Composition::OneOf(&self.one_of)
        } else if !self.any_of.is_empty() {
            Composition::AnyOf(&self.any_of)
        } else if !self.all_of.is_empty() {
            Composition::AllOf(&self.all_of)
        } else {
            Composition::Plain
        }
    }

    /// The effective type keyword. For a type list the first non-`null`
    /// entry wins. Without a `type`, `properties` imply `object` and `items`
    /// imply `array`.
    pub fn primary_type(&self) -> Option<SchemaType> {
        match &self.schema_type {
            Some(TypeSet::Single(t)) => Some(*t),
            Some(TypeSet::Multiple(types)) => types
                .iter()
                .copied()
                .find(|t| *t != SchemaType::Null)
                .or_else(|| types.first().copied()),
            None if !self.properties.is_empty() => Some(SchemaType::Object),
            None if self.items.is_some() => Some(SchemaType::Array),
            None => None,
        }
    }

    /// The first explicit example: `example`, then the first entry of
    /// `examples` (list or map form).
    pub fn explicit_example(&self) -> Option<&serde_json::Value> {
        if let Some(ref example) = self.example {
            return Some(example);
        }
        match self.examples.as_ref()? {
            serde_json::Value::Array(items) => items.first(),
            serde_json::Value::Object(named) => {
                let first = named.values().next()?;
                // Map form mirrors Example objects: prefer their `value`.
                Some(first.get("value").unwrap_or(first))
            }
            _ => None,
        }
    }
}
