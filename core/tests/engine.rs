use oas_synth_core::{
    load_document, normalize_components, normalize_pointer, normalize_schema,
    synthesize_pointer, synthesize_schema, AppError, EngineOptions, Normalizer, RefResolver,
    SchemaContext,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

fn count_circular(value: &Value) -> usize {
    match value {
        Value::Object(map) => {
            usize::from(map.get("circular") == Some(&json!(true)))
                + map.values().map(count_circular).sum::<usize>()
        }
        Value::Array(items) => items.iter().map(count_circular).sum(),
        _ => 0,
    }
}

#[test]
fn test_all_of_end_to_end() {
    let doc = json!({});
    let schema = json!({
        "allOf": [
            { "type": "object", "properties": { "id": { "type": "integer" } }, "required": ["id"] },
            { "properties": { "name": { "type": "string", "default": "Ann" } } }
        ]
    });
    let options = EngineOptions::default();

    let normalized = normalize_schema(&doc, &schema, "#", SchemaContext::Other, &options).unwrap();
    assert_eq!(
        normalized.to_value(),
        json!({
            "$schema": DRAFT_04,
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string", "default": "Ann" }
            },
            "required": ["id"]
        })
    );

    let value = synthesize_schema(&doc, &schema, "#", SchemaContext::Other, &options).unwrap();
    assert_eq!(value, Some(json!({ "id": "<integer>", "name": "Ann" })));
}

#[test]
fn test_normalization_is_idempotent() {
    let doc = load_document(
        r#"
components:
  schemas:
    Pet:
      allOf:
        - $ref: '#/components/schemas/Named'
        - type: object
          required: [kind]
          discriminator: { propertyName: kind }
          properties:
            kind: { type: string, enum: [cat, dog], nullable: true }
            tags:
              type: array
              items: { type: string, maxLength: 8 }
            owner: { $ref: '#/components/schemas/Pet' }
    Named:
      type: object
      properties:
        name: { type: string, minLength: 1, x-internal: true }
"#,
    )
    .unwrap();
    let options = EngineOptions::default();
    let first =
        normalize_pointer(&doc, "#/components/schemas/Pet", SchemaContext::Other, &options)
            .unwrap();
    let first_value = first.to_value();

    let empty = json!({});
    let second =
        normalize_schema(&empty, &first_value, "#", SchemaContext::Other, &options).unwrap();
    assert_eq!(second.to_value(), first_value);
    assert_eq!(first_value["properties"]["kind"]["enum"], json!(["cat", "dog", null]));
    assert_eq!(first_value["discriminator"], json!("kind"));
}

#[test]
fn test_cycles_terminate_once_per_path() {
    let doc = json!({
        "components": { "schemas": {
            "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
            "B": {
                "type": "object",
                "properties": {
                    "a": { "$ref": "#/components/schemas/A" },
                    "self": { "$ref": "#/components/schemas/B" }
                }
            }
        } }
    });
    let options = EngineOptions::default();
    let normalized =
        normalize_pointer(&doc, "#/components/schemas/A", SchemaContext::Other, &options)
            .unwrap()
            .to_value();

    assert_eq!(normalized["properties"]["b"]["type"], json!("object"));
    assert_eq!(
        normalized["properties"]["b"]["properties"]["a"],
        json!({ "circular": true })
    );
    assert_eq!(
        normalized["properties"]["b"]["properties"]["self"],
        json!({ "circular": true })
    );
    assert_eq!(count_circular(&normalized), 2);

    // Every named schema terminates on its own.
    let all = normalize_components(&doc, SchemaContext::Other, &options);
    assert!(all.values().all(Result::is_ok));
}

#[test]
fn test_alias_closing_cycle_does_not_poison_siblings() {
    let doc = json!({
        "components": { "schemas": {
            "Root": {
                "type": "object",
                "properties": {
                    "x": { "$ref": "#/components/schemas/B" },
                    "y": { "$ref": "#/components/schemas/A" }
                }
            },
            "A": { "$ref": "#/components/schemas/B" },
            "B": {
                "type": "object",
                "properties": {
                    "p": { "$ref": "#/components/schemas/A" },
                    "v": { "type": "string" }
                }
            }
        } }
    });
    let options = EngineOptions::default();
    let mut resolver = RefResolver::new(&doc);
    let root = json!({ "$ref": "#/components/schemas/Root" });

    let normalized = Normalizer::new(SchemaContext::Other, &options)
        .normalize(&mut resolver, &root, "#")
        .unwrap()
        .to_value();

    assert!(resolver.is_idle());
    let x = &normalized["properties"]["x"];
    let y = &normalized["properties"]["y"];
    assert_eq!(y["type"], json!("object"));
    assert_eq!(y["properties"]["v"], json!({ "type": "string" }));
    assert_eq!(y["properties"]["p"], json!({ "circular": true }));
    assert_eq!(x, y);
}

#[test]
fn test_sibling_references_are_not_cycles() {
    let doc = json!({
        "components": { "schemas": {
            "Money": { "type": "object", "properties": { "amount": { "type": "number", "example": 1.5 } } },
            "Order": {
                "type": "object",
                "properties": {
                    "total": { "$ref": "#/components/schemas/Money" },
                    "tax": { "$ref": "#/components/schemas/Money" }
                }
            }
        } }
    });
    let options = EngineOptions::default();
    let normalized =
        normalize_pointer(&doc, "#/components/schemas/Order", SchemaContext::Other, &options)
            .unwrap()
            .to_value();
    assert_eq!(count_circular(&normalized), 0);
    assert_eq!(
        synthesize_pointer(&doc, "#/components/schemas/Order", SchemaContext::Other, &options)
            .unwrap(),
        Some(json!({ "total": { "amount": 1.5 }, "tax": { "amount": 1.5 } }))
    );
}

#[test]
fn test_conflict_fails_only_its_own_call() {
    let doc = json!({
        "components": { "schemas": {
            "Bad": { "allOf": [{ "type": "string" }, { "type": "object" }] },
            "Good": { "allOf": [{ "type": "string" }, { "maxLength": 3 }] }
        } }
    });
    let options = EngineOptions::default();

    let err = normalize_pointer(&doc, "#/components/schemas/Bad", SchemaContext::Other, &options)
        .unwrap_err();
    match err {
        AppError::TypeConflict { location, .. } => {
            assert_eq!(location, "#/components/schemas/Bad")
        }
        other => panic!("unexpected error: {other}"),
    }

    let good = normalize_pointer(&doc, "#/components/schemas/Good", SchemaContext::Other, &options)
        .unwrap();
    assert_eq!(good.max_length, Some(3));
}

#[test]
fn test_context_projection_symmetry() {
    let doc = json!({
        "components": { "schemas": { "User": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "readOnly": true },
                "password": { "type": "string", "writeOnly": true },
                "name": { "type": "string" }
            },
            "required": ["id", "password", "name"]
        } } }
    });
    let options = EngineOptions::default();
    let pointer = "#/components/schemas/User";

    let request = normalize_pointer(&doc, pointer, SchemaContext::Request, &options).unwrap();
    let response = normalize_pointer(&doc, pointer, SchemaContext::Response, &options).unwrap();
    let other = normalize_pointer(&doc, pointer, SchemaContext::Other, &options).unwrap();

    let keys = |s: &oas_synth_core::NormalizedSchema| {
        s.properties
            .as_ref()
            .map(|p| p.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default()
    };
    assert_eq!(keys(&request), vec!["password", "name"]);
    assert_eq!(keys(&response), vec!["id", "name"]);
    assert_eq!(keys(&other), vec!["id", "password", "name"]);
    assert_eq!(request.required, Some(vec!["password".to_string(), "name".to_string()]));
}

#[test]
fn test_fallback_is_seeded() {
    let doc = json!({});
    let schema = json!({ "type": "string", "format": "uuid" });
    let mut options = EngineOptions::default();
    options.synthesis.seed = 42;

    let a = synthesize_schema(&doc, &schema, "#", SchemaContext::Other, &options).unwrap();
    let b = synthesize_schema(&doc, &schema, "#", SchemaContext::Other, &options).unwrap();
    assert!(a.is_some());
    assert_eq!(a, b);

    options.synthesis.fallback_sampling = false;
    assert_eq!(
        synthesize_schema(&doc, &schema, "#", SchemaContext::Other, &options).unwrap(),
        None
    );
}
