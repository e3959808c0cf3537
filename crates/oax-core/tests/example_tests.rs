use oax_core::endpoint::find_endpoint;
use oax_core::parse::RefOr;
use oax_core::parse::schema::{Schema, SchemaOrRef};
use oax_core::{DEPTH_LIMIT, Document, ExampleGenerator, RefResolver, TypeProjector, parse};
use serde_json::{Value, json};

fn petstore() -> Document {
    parse::from_yaml(include_str!("fixtures/petstore.yaml")).expect("should parse petstore")
}

fn cyclic() -> Document {
    parse::from_yaml(include_str!("fixtures/cyclic.yaml")).expect("should parse cyclic")
}

fn schema_ref(name: &str) -> SchemaOrRef {
    RefOr::reference(format!("#/components/schemas/{name}"))
}

fn pet_example() -> Value {
    json!({
        "id": 0,
        "name": "string",
        "status": "available",
        "born": "2024-01-01",
        "owner": {
            "email": "user@example.com",
            "address": { "city": "Lisbon", "zip": "string" }
        },
        "tags": ["string"]
    })
}

#[test]
fn test_enum_property_example_and_shape() {
    let doc = Document {
        openapi: "3.1.0".into(),
        ..Default::default()
    };
    let resolver = RefResolver::new(&doc);
    let node: SchemaOrRef = serde_json::from_value(json!({
        "type": "object",
        "properties": { "name": { "type": "string", "enum": ["a", "b"] } }
    }))
    .unwrap();

    let example = ExampleGenerator::new(resolver).example(&node, 0);
    assert_eq!(example, Some(json!({ "name": "a" })));

    let shape = TypeProjector::new(resolver).type_shape(&node, 0);
    insta::assert_snapshot!(shape.to_string(), @r#"{"name":"enum(a|b)"}"#);
}

#[test]
fn test_component_schema_example() {
    let doc = petstore();
    let generator = ExampleGenerator::new(RefResolver::new(&doc));
    assert_eq!(generator.example(&schema_ref("Pet"), 0), Some(pet_example()));
}

#[test]
fn test_all_of_merges_branches() {
    let doc = petstore();
    let generator = ExampleGenerator::new(RefResolver::new(&doc));
    let mut expected = pet_example();
    expected["nickname"] = json!("string");
    assert_eq!(generator.example(&schema_ref("NewPet"), 0), Some(expected));
}

#[test]
fn test_self_reference_is_truncated_at_depth_limit() {
    let doc = cyclic();
    let generator = ExampleGenerator::new(RefResolver::new(&doc));
    let example = generator.example(&schema_ref("Node"), 0).unwrap();

    let mut levels = 0;
    let mut current = &example;
    while let Value::Object(fields) = current {
        assert!(fields.contains_key("name"));
        levels += 1;
        current = &fields["self"];
    }
    assert_eq!(current, &Value::Null);
    assert_eq!(levels, DEPTH_LIMIT + 1);
}

#[test]
fn test_mutual_recursion_terminates() {
    let doc = cyclic();
    let resolver = RefResolver::new(&doc);
    let generator = ExampleGenerator::new(resolver);
    assert!(generator.example(&schema_ref("Parent"), 0).is_some());
    assert!(generator.example(&schema_ref("Wrapper"), 0).is_some());
    assert_eq!(generator.example(&schema_ref("Loop"), 0), None);

    let shape = TypeProjector::new(resolver).with_max_depth(2).type_shape(&schema_ref("Parent"), 0);
    insta::assert_snapshot!(shape.to_string(), @r#"{"child":{"parent":{"child":"any"}}}"#);
}

#[test]
fn test_shallower_depth_limit() {
    let doc = cyclic();
    let generator = ExampleGenerator::new(RefResolver::new(&doc)).with_max_depth(1);
    assert_eq!(
        generator.example(&schema_ref("Node"), 0),
        Some(json!({ "name": "string", "self": { "name": null, "self": null } }))
    );
}

#[test]
fn test_component_type_shapes() {
    let doc = petstore();
    let projector = TypeProjector::new(RefResolver::new(&doc));

    insta::assert_snapshot!(
        projector.type_shape(&schema_ref("Pet"), 0).to_string(),
        @r#"{"id":"integer","name":"string","status":"enum(available|pending|sold)","born":"string(date)","owner":{"email":"string(email)","address":{"city":"string","zip":"string"}},"tags":["string"]}"#
    );
    insta::assert_snapshot!(
        projector.type_shape(&schema_ref("NewPet"), 0).to_string(),
        @r#"{"allOf[0]":{"id":"integer","name":"string","status":"enum(available|pending|sold)","born":"string(date)","owner":{"email":"string(email)","address":{"city":"string","zip":"string"}},"tags":["string"]},"allOf[1]":{"nickname":"string"}}"#
    );
}

#[test]
fn test_response_examples() {
    let doc = petstore();
    let generator = ExampleGenerator::new(RefResolver::new(&doc));

    let list = find_endpoint(&doc, "get:/pets").unwrap();
    assert_eq!(
        generator.response_example(list.operation, "200"),
        Some(json!([pet_example()]))
    );
    assert_eq!(generator.response_example(list.operation, "500"), None);

    // Named example reached through a response reference and an example reference.
    let fetch = find_endpoint(&doc, "get:/pets/{petId}").unwrap();
    assert_eq!(
        generator.response_example(fetch.operation, "200"),
        Some(json!({ "id": 1, "name": "Rex" }))
    );
    assert_eq!(generator.response_example(fetch.operation, "404"), None);

    let health = find_endpoint(&doc, "get:/health").unwrap();
    assert_eq!(
        generator.response_example(health.operation, "200"),
        Some(json!({ "status": "up" }))
    );
}

#[test]
fn test_request_body_and_parameter_examples() {
    let doc = petstore();
    let resolver = RefResolver::new(&doc);
    let generator = ExampleGenerator::new(resolver);

    let create = find_endpoint(&doc, "post:/pets").unwrap();
    let body = generator.request_body_example(create.operation).unwrap();
    assert_eq!(body["nickname"], json!("string"));
    assert_eq!(body["status"], json!("available"));

    let list = find_endpoint(&doc, "get:/pets").unwrap();
    let params = &list.operation.parameters;
    assert_eq!(generator.parameter_example(&params[0]), Some(json!(1)));
    assert_eq!(generator.parameter_example(&params[1]), Some(json!("available")));
}

#[test]
fn test_form_fields_skip_unresolved() {
    let doc = petstore();
    let generator = ExampleGenerator::new(RefResolver::new(&doc));
    let node: SchemaOrRef = RefOr::Item(Schema {
        properties: [
            (
                "name".to_string(),
                RefOr::Item(serde_json::from_value(json!({ "type": "string" })).unwrap()),
            ),
            ("ghost".to_string(), schema_ref("Ghost")),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    });

    let fields = generator.form_fields(&node);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields["name"], json!("string"));
    assert!(generator.form_fields(&schema_ref("PetStatus")).is_empty());
}
