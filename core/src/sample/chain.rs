#![deny(missing_docs)]

//! # Example Priority Chain
//!
//! Picks an example literal for a schema. The first rule that yields a value wins:
//!
//! 1. `example` (then the first entry of a JSON Schema `examples` array).
//! 2. `default`; an array without one uses `[items.default]`.
//! 3. The first `enum` entry; an array without one uses `[items.enum[0]]`.
//! 4. `boolean` → `true`.
//! 5. `object` → every visible property through this chain. Unresolved
//!    required properties become a `"<type>"` placeholder, unresolved
//!    optional ones are left out.
//! 6. An array of objects → a one-element array holding one such object.
//! 7. Otherwise, only at the top of a request, the random [`SchemaFaker`].
//!
//! Selection is always "first", never random, so fixtures are reproducible.

use crate::error::AppResult;
use crate::oas::pointer::join_pointer;
use crate::oas::resolver::{is_circular, ref_pointer, RefResolver};
use crate::options::EngineOptions;
use crate::sample::faker::SchemaFaker;
use crate::schema::merge::merge_all_of;
use crate::schema::model::{NormalizedSchema, SchemaContext};
use crate::schema::normalize::resolve_type;
use serde_json::{json, Map, Value};
use tracing::trace;

/// Resolves example values for one projection context.
pub struct Synthesizer<'o> {
    context: SchemaContext,
    options: &'o EngineOptions,
}

impl<'o> Synthesizer<'o> {
    /// Creates a synthesizer for `context`.
    pub fn new(context: SchemaContext, options: &'o EngineOptions) -> Self {
        Self { context, options }
    }

    /// The projection context properties are filtered by.
    pub fn context(&self) -> SchemaContext {
        self.context
    }

    /// Runs the full chain including the random fallback (rule 7).
    pub fn synthesize(
        &self,
        resolver: &mut RefResolver<'_>,
        node: &Value,
        location: &str,
    ) -> AppResult<Option<Value>> {
        if let Some(value) = self.resolve(resolver, node, location)? {
            return Ok(Some(value));
        }
        if !self.options.synthesis.fallback_sampling {
            return Ok(None);
        }
        trace!(location, "falling back to schema sampling");
        SchemaFaker::new(self.context, &self.options.synthesis).sample(resolver, node, location)
    }

    /// Runs rules 1 to 6. `None` means no rule applied.
    pub fn resolve(
        &self,
        resolver: &mut RefResolver<'_>,
        node: &Value,
        location: &str,
    ) -> AppResult<Option<Value>> {
        let resolved = resolver.deref(node, false);
        if is_circular(&resolved) {
            return Ok(None);
        }
        let location = ref_pointer(node).unwrap_or(location).to_string();
        let result = self.resolve_resolved(resolver, resolved, &location);
        resolver.exit_ref(node);
        result
    }

    fn resolve_resolved(
        &self,
        resolver: &mut RefResolver<'_>,
        schema: Value,
        location: &str,
    ) -> AppResult<Option<Value>> {
        let merged = merge_all_of(resolver, schema, location)?;
        let result = match &merged.schema {
            Value::Object(map) => self.resolve_map(resolver, map, location),
            _ => Ok(None),
        };
        merged.release(resolver);
        result
    }

    fn resolve_map(
        &self,
        resolver: &mut RefResolver<'_>,
        map: &Map<String, Value>,
        location: &str,
    ) -> AppResult<Option<Value>> {
        if let Some(example) = literal(map, "example") {
            return Ok(Some(example));
        }
        if let Some(Value::Array(examples)) = map.get("examples") {
            if let Some(first) = examples.first() {
                return Ok(Some(first.clone()));
            }
        }

        let schema_type = resolve_type(map);
        let type_name = schema_type.as_ref().map(|t| t.primary()).unwrap_or("");
        let items = map.get("items").filter(|items| items.is_object());

        if let Some(default) = literal(map, "default") {
            return Ok(Some(default));
        }
        if type_name == "array" {
            if let Some(default) = items.and_then(|i| literal_of(resolver.peek(i), "default")) {
                return Ok(Some(json!([default])));
            }
        }

        if let Some(first) = first_enum(map) {
            return Ok(Some(first));
        }
        if type_name == "array" {
            if let Some(first) = items.and_then(|i| resolver.peek(i).as_object()).and_then(first_enum)
            {
                return Ok(Some(json!([first])));
            }
        }

        match type_name {
            "boolean" => Ok(Some(Value::Bool(true))),
            "object" => self.resolve_object(resolver, map, location).map(Some),
            "array" => match items {
                Some(items) if looks_like_object(resolver.peek(items)) => {
                    let item_location = join_pointer(location, "items");
                    Ok(self
                        .resolve(resolver, items, &item_location)?
                        .filter(Value::is_object)
                        .map(|object| json!([object])))
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn resolve_object(
        &self,
        resolver: &mut RefResolver<'_>,
        map: &Map<String, Value>,
        location: &str,
    ) -> AppResult<Value> {
        let required: Vec<&str> = match map.get("required") {
            Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        let mut object = Map::new();
        if let Some(Value::Object(properties)) = map.get("properties") {
            let props_location = join_pointer(location, "properties");
            for (name, property) in properties {
                if self.context.hides(resolver.peek(property)) {
                    continue;
                }
                let prop_location = join_pointer(&props_location, name);
                match self.resolve(resolver, property, &prop_location)? {
                    Some(value) => {
                        object.insert(name.clone(), value);
                    }
                    None if required.contains(&name.as_str()) => {
                        object.insert(name.clone(), placeholder_for(resolver.peek(property)));
                    }
                    None => {}
                }
            }
        }
        Ok(Value::Object(object))
    }
}

/// The stand-in for a required value nothing could resolve: `"<type>"`.
pub fn placeholder_for(schema: &Value) -> Value {
    let type_name = schema
        .as_object()
        .and_then(resolve_type)
        .map(|t| t.primary().to_string())
        .unwrap_or_else(|| "any".to_string());
    Value::String(format!("<{}>", type_name))
}

/// Returns true if a placeholder produced by [`placeholder_for`].
pub fn is_placeholder(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| s.len() > 2 && s.starts_with('<') && s.ends_with('>'))
        .unwrap_or(false)
}

fn literal(map: &Map<String, Value>, key: &str) -> Option<Value> {
    map.get(key).filter(|v| !v.is_null()).cloned()
}

fn literal_of(schema: &Value, key: &str) -> Option<Value> {
    schema.as_object().and_then(|map| literal(map, key))
}

fn first_enum(map: &Map<String, Value>) -> Option<Value> {
    match map.get("enum") {
        Some(Value::Array(values)) => values.first().cloned(),
        _ => None,
    }
}

fn looks_like_object(schema: &Value) -> bool {
    let Some(map) = schema.as_object() else {
        return false;
    };
    map.contains_key("allOf")
        || resolve_type(map)
            .map(|t| t.primary() == "object")
            .unwrap_or(false)
}

/// Synthesizes an example for `node` in its own traversal (rules 1 to 7).
pub fn synthesize_schema(
    document: &Value,
    node: &Value,
    location: &str,
    context: SchemaContext,
    options: &EngineOptions,
) -> AppResult<Option<Value>> {
    let mut resolver = RefResolver::new(document);
    Synthesizer::new(context, options).synthesize(&mut resolver, node, location)
}

/// Synthesizes an example for the schema at `pointer`.
pub fn synthesize_pointer(
    document: &Value,
    pointer: &str,
    context: SchemaContext,
    options: &EngineOptions,
) -> AppResult<Option<Value>> {
    synthesize_schema(document, &json!({ "$ref": pointer }), pointer, context, options)
}

/// Runs the chain over an already normalized schema.
pub fn resolve_normalized_value(
    schema: &NormalizedSchema,
    context: SchemaContext,
    options: &EngineOptions,
) -> AppResult<Option<Value>> {
    let document = Value::Object(Map::new());
    synthesize_schema(&document, &schema.to_value(), "#", context, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_fallback() -> EngineOptions {
        let mut options = EngineOptions::default();
        options.synthesis.fallback_sampling = false;
        options
    }

    fn resolve(document: &Value, node: Value) -> Option<Value> {
        let options = no_fallback();
        let mut resolver = RefResolver::new(document);
        let value = Synthesizer::new(SchemaContext::Other, &options)
            .resolve(&mut resolver, &node, "#")
            .unwrap();
        assert!(resolver.is_idle());
        value
    }

    #[test]
    fn test_example_beats_default() {
        let doc = json!({});
        let value = resolve(&doc, json!({ "type": "string", "example": "ex", "default": "def" }));
        assert_eq!(value, Some(json!("ex")));
    }

    #[test]
    fn test_default_when_no_example() {
        let doc = json!({});
        let value = resolve(&doc, json!({ "type": "string", "default": "def", "enum": ["a"] }));
        assert_eq!(value, Some(json!("def")));
    }

    #[test]
    fn test_first_enum_is_deterministic() {
        let doc = json!({});
        for _ in 0..5 {
            assert_eq!(resolve(&doc, json!({ "enum": [1, 2, 3] })), Some(json!(1)));
        }
    }

    #[test]
    fn test_array_uses_item_default_then_item_enum() {
        let doc = json!({ "components": { "schemas": { "Color": { "enum": ["red", "blue"] } } } });
        assert_eq!(
            resolve(&doc, json!({ "type": "array", "items": { "default": 7 } })),
            Some(json!([7]))
        );
        assert_eq!(
            resolve(
                &doc,
                json!({ "type": "array", "items": { "$ref": "#/components/schemas/Color" } })
            ),
            Some(json!(["red"]))
        );
    }

    #[test]
    fn test_boolean_is_true() {
        let doc = json!({});
        assert_eq!(resolve(&doc, json!({ "type": "boolean" })), Some(json!(true)));
    }

    #[test]
    fn test_required_placeholder_and_optional_omitted() {
        let doc = json!({});
        let value = resolve(
            &doc,
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "nickname": { "type": "string" },
                    "anything": {}
                },
                "required": ["id", "anything"]
            }),
        );
        assert_eq!(value, Some(json!({ "id": "<string>", "anything": "<any>" })));
    }

    #[test]
    fn test_array_of_objects() {
        let doc = json!({
            "components": { "schemas": { "Tag": {
                "type": "object",
                "properties": { "label": { "type": "string", "example": "new" } }
            } } }
        });
        let value = resolve(
            &doc,
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/Tag" } }),
        );
        assert_eq!(value, Some(json!([{ "label": "new" }])));
    }

    #[test]
    fn test_scalar_without_data_is_unresolved() {
        let doc = json!({});
        assert_eq!(resolve(&doc, json!({ "type": "integer" })), None);
        assert_eq!(resolve(&doc, json!({ "type": "array", "items": { "type": "string" } })), None);
    }

    #[test]
    fn test_context_skips_hidden_properties() {
        let doc = json!({});
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "readOnly": true, "example": 1 },
                "secret": { "type": "string", "writeOnly": true, "example": "pw" }
            }
        });
        let options = no_fallback();
        let mut resolver = RefResolver::new(&doc);
        let request = Synthesizer::new(SchemaContext::Request, &options)
            .resolve(&mut resolver, &schema, "#")
            .unwrap();
        assert_eq!(request, Some(json!({ "secret": "pw" })));
        let response = Synthesizer::new(SchemaContext::Response, &options)
            .resolve(&mut resolver, &schema, "#")
            .unwrap();
        assert_eq!(response, Some(json!({ "id": 1 })));
    }

    #[test]
    fn test_recursive_schema_terminates() {
        let doc = json!({
            "components": { "schemas": { "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string", "example": "root" },
                    "parent": { "$ref": "#/components/schemas/Node" }
                },
                "required": ["parent"]
            } } }
        });
        let value = resolve(&doc, json!({ "$ref": "#/components/schemas/Node" }));
        assert_eq!(
            value,
            Some(json!({ "name": "root", "parent": "<object>" }))
        );
    }

    #[test]
    fn test_fallback_only_at_top() {
        let doc = json!({});
        let options = EngineOptions::default();
        let mut resolver = RefResolver::new(&doc);
        let value = Synthesizer::new(SchemaContext::Other, &options)
            .synthesize(&mut resolver, &json!({ "type": "integer", "minimum": 5, "maximum": 5 }), "#")
            .unwrap();
        assert_eq!(value, Some(json!(5)));
    }

    #[test]
    fn test_resolve_normalized_value() {
        let schema: NormalizedSchema = serde_json::from_value(json!({
            "type": "object",
            "properties": { "flag": { "type": "boolean" }, "n": { "type": "integer" } },
            "required": ["n"]
        }))
        .unwrap();
        let value =
            resolve_normalized_value(&schema, SchemaContext::Other, &no_fallback()).unwrap();
        assert_eq!(value, Some(json!({ "flag": true, "n": "<integer>" })));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(&json!("<string>")));
        assert!(!is_placeholder(&json!("<>")));
        assert!(!is_placeholder(&json!("plain")));
    }
}
