use std::fmt;

use indexmap::IndexMap;
use log::trace;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::DEPTH_LIMIT;
use crate::parse::schema::{Composition, Schema, SchemaOrRef, SchemaType};
use crate::resolve::RefResolver;

/// Marker for nodes with no usable type: unresolved, truncated, or untyped.
pub const ANY_TYPE: &str = "any";

/// Simplified structural type of a schema, for display.
///
/// Serializes to plain JSON: objects become maps, arrays a one-element
/// list, scalars a descriptor string such as `string(date)` or
/// `enum(a|b)`, and composition branches a map keyed `allOf[0]`,
/// `oneOf[1]`, and so on, after any properties the composed schema
/// declares itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Object(IndexMap<String, TypeShape>),
    Array(Box<TypeShape>),
    Composite {
        keyword: &'static str,
        properties: IndexMap<String, TypeShape>,
        branches: Vec<TypeShape>,
    },
    Scalar(String),
    Any,
}

impl TypeShape {
    pub fn scalar(descriptor: impl Into<String>) -> Self {
        TypeShape::Scalar(descriptor.into())
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TypeShape::Object(fields) => serde_json::Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            TypeShape::Array(item) => serde_json::Value::Array(vec![item.to_json()]),
            TypeShape::Composite {
                keyword,
                properties,
                branches,
            } => serde_json::Value::Object(
                properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .chain(
                        branches
                            .iter()
                            .enumerate()
                            .map(|(i, b)| (branch_label(keyword, i), b.to_json())),
                    )
                    .collect(),
            ),
            TypeShape::Scalar(s) => serde_json::Value::String(s.clone()),
            TypeShape::Any => serde_json::Value::String(ANY_TYPE.to_string()),
        }
    }
}

fn branch_label(keyword: &str, index: usize) -> String {
    format!("{keyword}[{index}]")
}

impl Serialize for TypeShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeShape::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, shape) in fields {
                    map.serialize_entry(name, shape)?;
                }
                map.end()
            }
            TypeShape::Array(item) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(item.as_ref())?;
                seq.end()
            }
            TypeShape::Composite {
                keyword,
                properties,
                branches,
            } => {
                let mut map = serializer.serialize_map(Some(properties.len() + branches.len()))?;
                for (name, shape) in properties {
                    map.serialize_entry(name, shape)?;
                }
                for (i, branch) in branches.iter().enumerate() {
                    map.serialize_entry(&branch_label(keyword, i), branch)?;
                }
                map.end()
            }
            TypeShape::Scalar(s) => serializer.serialize_str(s),
            TypeShape::Any => serializer.serialize_str(ANY_TYPE),
        }
    }
}

/// Compact JSON rendering.
impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Projects schema graphs onto [`TypeShape`]s, with the same depth bound as
/// example generation.
#[derive(Debug, Clone, Copy)]
pub struct TypeProjector<'a> {
    resolver: RefResolver<'a>,
    max_depth: usize,
}

impl<'a> TypeProjector<'a> {
    pub fn new(resolver: RefResolver<'a>) -> Self {
        Self {
            resolver,
            max_depth: DEPTH_LIMIT,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn type_shape(&self, node: &SchemaOrRef, depth: usize) -> TypeShape {
        if depth > self.max_depth {
            trace!("type depth {depth} exceeds {}, truncating", self.max_depth);
            return TypeShape::Any;
        }
        match self.resolver.resolve_item(node) {
            Some(schema) => self.project(schema, depth),
            None => TypeShape::Any,
        }
    }

    fn project(&self, schema: &Schema, depth: usize) -> TypeShape {
        let composition = schema.composition();
        if let (
            Some(keyword),
            Composition::AllOf(branches)
            | Composition::OneOf(branches)
            | Composition::AnyOf(branches),
        ) = (composition.keyword(), composition)
        {
            return TypeShape::Composite {
                keyword,
                properties: self.properties(schema, depth),
                branches: branches
                    .iter()
                    .map(|b| self.type_shape(b, depth + 1))
                    .collect(),
            };
        }

        let string_like = matches!(schema.primary_type(), Some(SchemaType::String) | None);
        if string_like && !schema.enum_values.is_empty() {
            return TypeShape::Scalar(enum_descriptor(&schema.enum_values));
        }

        match schema.primary_type() {
            Some(SchemaType::Object) => TypeShape::Object(self.properties(schema, depth)),
            Some(SchemaType::Array) => TypeShape::Array(Box::new(match schema.items {
                Some(ref items) => self.type_shape(items, depth + 1),
                None => TypeShape::Any,
            })),
            Some(SchemaType::String) => match schema.format {
                Some(ref format) => TypeShape::Scalar(format!("string({format})")),
                None => TypeShape::scalar("string"),
            },
            Some(other) => TypeShape::scalar(other.as_str()),
            None => TypeShape::Any,
        }
    }

    fn properties(&self, schema: &Schema, depth: usize) -> IndexMap<String, TypeShape> {
        schema
            .properties
            .iter()
            .map(|(name, prop)| (name.clone(), self.type_shape(prop, depth + 1)))
            .collect()
    }
}

fn enum_descriptor(values: &[serde_json::Value]) -> String {
    let rendered: Vec<String> = values
        .iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    format!("enum({})", rendered.join("|"))
}
