#![deny(missing_docs)]

//! # Media Type Examples
//!
//! Gathers every example a Media Type Object offers, in a fixed order:
//! the inline `example`, each named `examples` entry, then one value
//! synthesized from the `schema`.

use crate::error::AppResult;
use crate::oas::pointer::join_pointer;
use crate::oas::resolver::{is_circular, RefResolver};
use crate::sample::chain::Synthesizer;
use serde_json::{Map, Value};

/// Picks the media type used for a single representative payload:
/// `application/json`, then any other JSON flavour, then the first declared.
pub fn preferred_media_type(content: &Map<String, Value>) -> Option<(&String, &Value)> {
    content
        .iter()
        .find(|(name, _)| essence(name) == "application/json")
        .or_else(|| {
            content.iter().find(|(name, _)| {
                let essence = essence(name);
                essence.ends_with("+json") || essence.ends_with("/json")
            })
        })
        .or_else(|| content.iter().next())
}

fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or(media_type)
        .trim()
        .to_ascii_lowercase()
}

/// The payload of an Example Object (`value`, else `externalValue`).
/// The node may be a reference.
pub fn named_example_value(resolver: &mut RefResolver<'_>, example: &Value) -> Option<Value> {
    let resolved = resolver.deref(example, false);
    if is_circular(&resolved) {
        return None;
    }
    let value = resolved
        .get("value")
        .filter(|v| !v.is_null())
        .or_else(|| resolved.get("externalValue").filter(|v| !v.is_null()))
        .cloned();
    resolver.exit_ref(example);
    value
}

/// Every example available for one media type, best first.
///
/// # Arguments
///
/// * `synth` - Example chain used for the trailing schema-derived value.
/// * `resolver` - Per-traversal resolution state.
/// * `media` - The Media Type Object.
/// * `location` - Pointer of `media`.
pub fn collect_media_examples(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'_>,
    media: &Value,
    location: &str,
) -> AppResult<Vec<Value>> {
    let mut examples = Vec::new();
    if let Some(example) = media.get("example").filter(|v| !v.is_null()) {
        examples.push(example.clone());
    }
    if let Some(Value::Object(named)) = media.get("examples") {
        for example in named.values() {
            if let Some(value) = named_example_value(resolver, example) {
                examples.push(value);
            }
        }
    }
    if let Some(schema) = media.get("schema") {
        let schema_location = join_pointer(location, "schema");
        if let Some(value) = synth.synthesize(resolver, schema, &schema_location)? {
            examples.push(value);
        }
    }
    Ok(examples)
}

/// The single representative example of a media type.
///
/// Stops at the first source that yields a value, so the schema is only
/// synthesized when no literal example exists.
pub fn media_example(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'_>,
    media: &Value,
    location: &str,
) -> AppResult<Option<Value>> {
    if let Some(example) = media.get("example").filter(|v| !v.is_null()) {
        return Ok(Some(example.clone()));
    }
    if let Some(Value::Object(named)) = media.get("examples") {
        if let Some(value) = named
            .values()
            .next()
            .and_then(|first| named_example_value(resolver, first))
        {
            return Ok(Some(value));
        }
    }
    match media.get("schema") {
        Some(schema) => synth.synthesize(resolver, schema, &join_pointer(location, "schema")),
        None => Ok(None),
    }
}
