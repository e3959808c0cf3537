use log::{debug, trace};
use serde_json::{Map, Value, json};

use crate::DEPTH_LIMIT;
use crate::parse::example::Example;
use crate::parse::media_type::MediaType;
use crate::parse::operation::Operation;
use crate::parse::parameter::Parameter;
use crate::parse::reference::RefOr;
use crate::parse::schema::{AdditionalProperties, Composition, Schema, SchemaOrRef, SchemaType};
use crate::resolve::RefResolver;

/// Placeholder for schemas that carry no usable type information. Distinct
/// from `None`, which means "could not produce a value" (unresolvable
/// reference or depth cutoff).
pub const UNTYPED_EXAMPLE: &str = "<any>";

const GENERIC_STRING: &str = "string";
const ADDITIONAL_PROPERTY_KEY: &str = "additionalProp1";

/// Synthesizes representative JSON instances from schema graphs.
///
/// Explicit examples in the document always win over synthesis. Traversal
/// is bounded by `max_depth` so self-referential schemas terminate; branches
/// past the bound come back as `None` (rendered as JSON `null` inside
/// objects and arrays).
#[derive(Debug, Clone, Copy)]
pub struct ExampleGenerator<'a> {
    resolver: RefResolver<'a>,
    max_depth: usize,
}

impl<'a> ExampleGenerator<'a> {
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

    /// Example for a schema node at the given depth.
    pub fn example(&self, node: &SchemaOrRef, depth: usize) -> Option<Value> {
        if let RefOr::Item(schema) = node {
            if let Some(explicit) = schema.explicit_example() {
                return Some(explicit.clone());
            }
        }
        if depth > self.max_depth {
            trace!("example depth {depth} exceeds {}, truncating", self.max_depth);
            return None;
        }
        let Some(schema) = self.resolver.resolve_item(node) else {
            debug!("no example for unresolved node {:?}", node.ref_path());
            return None;
        };
        self.synthesize(schema, depth)
    }

    /// Object example for form-style callers: properties whose example is
    /// `null` are left out. Non-object schemas give an empty map.
    pub fn form_fields(&self, node: &SchemaOrRef) -> Map<String, Value> {
        match self.example(node, 0) {
            Some(Value::Object(fields)) => fields
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
            _ => Map::new(),
        }
    }

    /// Parameter example: the parameter's own `example`, then its first
    /// named example, then the example of its schema.
    pub fn parameter_example(&self, param: &RefOr<Parameter>) -> Option<Value> {
        let param = self.resolver.resolve_item(param)?;
        if let Some(ref example) = param.example {
            return Some(example.clone());
        }
        if let Some(value) = self.first_named_example(param.examples.values()) {
            return Some(value);
        }
        param.schema.as_ref().and_then(|s| self.example(s, 0))
    }

    /// Media type example: `example`, then the first named example, then the
    /// schema example.
    pub fn media_type_example(&self, media_type: &MediaType) -> Option<Value> {
        if let Some(ref example) = media_type.example {
            return Some(example.clone());
        }
        if let Some(value) = self.first_named_example(media_type.examples.values()) {
            return Some(value);
        }
        media_type.schema.as_ref().and_then(|s| self.example(s, 0))
    }

    /// Example request payload of an operation, from its preferred media type.
    pub fn request_body_example(&self, operation: &Operation) -> Option<Value> {
        let body = self.resolver.resolve_item(operation.request_body.as_ref()?)?;
        let (_, media_type) = body.preferred_content()?;
        self.media_type_example(media_type)
    }

    /// Example payload of one response of an operation.
    pub fn response_example(&self, operation: &Operation, status: &str) -> Option<Value> {
        let response = self.resolver.resolve_item(operation.responses.get(status)?)?;
        let (_, media_type) = response.preferred_content()?;
        self.media_type_example(media_type)
    }

    fn first_named_example<'e>(
        &self,
        mut examples: impl Iterator<Item = &'e RefOr<Example>>,
    ) -> Option<Value> {
        let first = examples.next()?;
        self.resolver.resolve_item(first)?.value.clone()
    }

    fn synthesize(&self, schema: &Schema, depth: usize) -> Option<Value> {
        if let Some(explicit) = schema.explicit_example() {
            return Some(explicit.clone());
        }
        if let Some(ref value) = schema.const_value {
            return Some(value.clone());
        }
        if let Some(ref value) = schema.default_value {
            return Some(value.clone());
        }
        if let Some(first) = schema.enum_values.first() {
            return Some(first.clone());
        }

        match schema.composition() {
            Composition::OneOf(branches) | Composition::AnyOf(branches) => {
                let chosen = branches.first().and_then(|b| self.example(b, depth + 1));
                if schema.primary_type() != Some(SchemaType::Object) {
                    return chosen;
                }
                // Branches that only constrain the schema's own object (e.g.
                // `required` alternatives) refine it rather than replace it.
                let mut fields = self.object_example(schema, depth);
                if let Some(Value::Object(extra)) = chosen {
                    fields.extend(extra);
                }
                return Some(Value::Object(fields));
            }
            Composition::AllOf(branches) => return self.merge_all_of(schema, branches, depth),
            Composition::Plain => {}
        }

        let value = match schema.primary_type() {
            Some(SchemaType::Object) => Value::Object(self.object_example(schema, depth)),
            Some(SchemaType::Array) => match schema.items {
                Some(ref items) => {
                    Value::Array(vec![self.example(items, depth + 1).unwrap_or(Value::Null)])
                }
                None => Value::Array(Vec::new()),
            },
            Some(SchemaType::String) => Value::String(string_placeholder(schema.format.as_deref())),
            Some(SchemaType::Integer) => json!(integer_in_range(schema)),
            Some(SchemaType::Number) => json!(number_in_range(schema)),
            Some(SchemaType::Boolean) => Value::Bool(true),
            Some(SchemaType::Null) => Value::Null,
            None => Value::String(UNTYPED_EXAMPLE.to_string()),
        };
        Some(value)
    }

    fn object_example(&self, schema: &Schema, depth: usize) -> Map<String, Value> {
        let mut fields: Map<String, Value> = schema
            .properties
            .iter()
            .map(|(name, prop)| {
                let value = self.example(prop, depth + 1).unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect();

        if fields.is_empty() {
            if let Some(AdditionalProperties::Schema(ref extra)) = schema.additional_properties {
                let value = self.example(extra, depth + 1).unwrap_or(Value::Null);
                fields.insert(ADDITIONAL_PROPERTY_KEY.to_string(), value);
            }
        }
        fields
    }

    /// `allOf` branches are generated independently; object results are
    /// merged key by key (later branches win), along with the schema's own
    /// properties. Without any object branch the first non-null branch
    /// example is used.
    fn merge_all_of(
        &self,
        schema: &Schema,
        branches: &[SchemaOrRef],
        depth: usize,
    ) -> Option<Value> {
        let mut merged = Map::new();
        let mut fallback = None;
        let mut saw_object = false;

        for branch in branches {
            match self.example(branch, depth + 1) {
                Some(Value::Object(fields)) => {
                    saw_object = true;
                    merged.extend(fields);
                }
                Some(other) if fallback.is_none() && !other.is_null() => fallback = Some(other),
                _ => {}
            }
        }

        if !schema.properties.is_empty() {
            saw_object = true;
            merged.extend(self.object_example(schema, depth));
        }

        if saw_object {
            Some(Value::Object(merged))
        } else {
            fallback
        }
    }
}

fn string_placeholder(format: Option<&str>) -> String {
    let placeholder = match format {
        Some("date") => "2024-01-01",
        Some("date-time") => "2024-01-01T00:00:00Z",
        Some("time") => "00:00:00Z",
        Some("email") => "user@example.com",
        Some("uuid") => "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        Some("uri" | "url") => "https://example.com",
        Some("hostname") => "example.com",
        Some("ipv4") => "192.168.0.1",
        Some("ipv6") => "::1",
        Some("byte") => "ZXhhbXBsZQ==",
        Some("binary") => "<binary>",
        Some("password") => "********",
        _ => GENERIC_STRING,
    };
    placeholder.to_string()
}

fn integer_in_range(schema: &Schema) -> i64 {
    let mut value: i64 = 0;
    if let Some(min) = schema.minimum {
        value = value.max(min.ceil() as i64);
    }
    if let Some(max) = schema.maximum {
        value = value.min(max.floor() as i64);
    }
    value
}

fn number_in_range(schema: &Schema) -> f64 {
    let mut value = 0.0_f64;
    if let Some(min) = schema.minimum {
        value = value.max(min);
    }
    if let Some(max) = schema.maximum {
        value = value.min(max);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::spec::Document;

    fn schema(yaml: &str) -> SchemaOrRef {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn empty_document() -> Document {
        Document {
            openapi: "3.1.0".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_enum_string_uses_first_value() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let node = schema(
            r#"
type: object
properties:
  name:
    type: string
    enum: [a, b]
"#,
        );
        assert_eq!(generator.example(&node, 0), Some(json!({ "name": "a" })));
    }

    #[test]
    fn test_explicit_example_wins_over_depth() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let node = schema("type: integer\nexample: 42\n");
        assert_eq!(generator.example(&node, 99), Some(json!(42)));
        assert_eq!(generator.example(&schema("type: integer\n"), 99), None);
    }

    #[test]
    fn test_primitives_and_formats() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let cases = [
            ("type: string", json!("string")),
            ("type: string\nformat: date", json!("2024-01-01")),
            ("type: string\nformat: date-time", json!("2024-01-01T00:00:00Z")),
            ("type: string\nformat: email", json!("user@example.com")),
            ("type: integer", json!(0)),
            ("type: integer\nminimum: 10\nmaximum: 20", json!(10)),
            ("type: integer\nmaximum: -5", json!(-5)),
            ("type: number\nminimum: 1.5", json!(1.5)),
            ("type: boolean", json!(true)),
            ("type: [string, 'null']", json!("string")),
            ("{}", json!(UNTYPED_EXAMPLE)),
        ];
        for (yaml, expected) in cases {
            assert_eq!(generator.example(&schema(yaml), 0), Some(expected), "{yaml}");
        }
    }

    #[test]
    fn test_array_examples() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        assert_eq!(
            generator.example(&schema("type: array\nitems:\n  type: integer\n"), 0),
            Some(json!([0]))
        );
        assert_eq!(generator.example(&schema("type: array"), 0), Some(json!([])));
    }

    #[test]
    fn test_unresolved_reference_is_none() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let node = RefOr::reference("#/components/schemas/Missing");
        assert_eq!(generator.example(&node, 0), None);

        let parent = schema(
            r#"
properties:
  missing:
    $ref: '#/components/schemas/Missing'
"#,
        );
        assert_eq!(generator.example(&parent, 0), Some(json!({ "missing": null })));
    }

    #[test]
    fn test_form_fields_drop_nulls() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let node = schema(
            r#"
type: object
properties:
  name:
    type: string
  owner:
    $ref: '#/components/schemas/Missing'
"#,
        );
        let fields = generator.form_fields(&node);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["name"], json!("string"));
    }

    #[test]
    fn test_composition() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let one_of = schema(
            r#"
oneOf:
  - type: integer
  - type: string
"#,
        );
        assert_eq!(generator.example(&one_of, 0), Some(json!(0)));

        let all_of = schema(
            r#"
allOf:
  - type: object
    properties:
      id: { type: integer }
  - type: object
    properties:
      name: { type: string }
"#,
        );
        assert_eq!(
            generator.example(&all_of, 0),
            Some(json!({ "id": 0, "name": "string" }))
        );
    }

    #[test]
    fn test_one_of_refines_own_properties() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let required_alternatives = schema(
            r#"
type: object
properties:
  a: { type: string }
  b: { type: integer }
oneOf:
  - required: [a]
  - required: [b]
"#,
        );
        assert_eq!(
            generator.example(&required_alternatives, 0),
            Some(json!({ "a": "string", "b": 0 }))
        );

        let object_branch = schema(
            r#"
properties:
  kind: { type: string }
anyOf:
  - type: object
    properties:
      kind: { const: cat }
      lives: { type: integer, default: 9 }
"#,
        );
        assert_eq!(
            generator.example(&object_branch, 0),
            Some(json!({ "kind": "cat", "lives": 9 }))
        );
    }

    #[test]
    fn test_additional_properties_map() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc));
        let node = schema("type: object\nadditionalProperties:\n  type: integer\n");
        assert_eq!(
            generator.example(&node, 0),
            Some(json!({ "additionalProp1": 0 }))
        );
    }

    #[test]
    fn test_custom_depth_limit() {
        let doc = empty_document();
        let generator = ExampleGenerator::new(RefResolver::new(&doc)).with_max_depth(0);
        let node = schema("type: object\nproperties:\n  a:\n    type: string\n");
        assert_eq!(generator.example(&node, 0), Some(json!({ "a": null })));
    }
}
