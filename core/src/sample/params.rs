#![deny(missing_docs)]

//! # Parameter and Header Examples
//!
//! Resolves a concrete value for a Parameter or Header Object. Sources are
//! tried in order:
//!
//! 1. The object's own `example`.
//! 2. The first entry of its named `examples`.
//! 3. For `content`-encoded parameters, the preferred media type's example
//!    or schema.
//! 4. Its `schema` through the example chain (including the random fallback).
//!
//! Swagger 2 parameters carry `type`/`enum`/`default` inline instead of a
//! `schema`; such a parameter is read as its own schema.

use crate::error::{AppError, AppResult};
use crate::oas::pointer::join_pointer;
use crate::oas::resolver::{is_circular, ref_pointer, RefResolver};
use crate::sample::chain::{is_placeholder, Synthesizer};
use crate::sample::media::{media_example, named_example_value, preferred_media_type};
use serde::Serialize;
use serde_json::{Map, Value};

/// A resolved parameter or header value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterExample {
    /// Parameter or header name.
    pub name: String,
    /// `path`, `query`, `header`, `cookie`, `formData` or `body`.
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the operation requires the value.
    pub required: bool,
    /// The resolved value, if any source produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Pointer of the parameter definition.
    #[serde(skip)]
    pub pointer: String,
}

impl ParameterExample {
    /// `(name, in)`: the identity of a parameter within an operation.
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.location)
    }
}

/// Resolves a Parameter Object (or a reference to one).
pub fn resolve_parameter(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'_>,
    parameter: &Value,
    location: &str,
) -> AppResult<ParameterExample> {
    let resolved = resolver.deref(parameter, false);
    let pointer = ref_pointer(parameter).unwrap_or(location).to_string();
    let circular = is_circular(&resolved);
    let map = match resolved {
        Value::Object(map) if !circular => map,
        _ => Map::new(),
    };

    let name = string_field(&map, "name");
    let param_in = string_field(&map, "in");
    let required = param_in == "path" || map.get("required").and_then(Value::as_bool) == Some(true);

    let value = if circular {
        None
    } else {
        let value = parameter_value(synth, resolver, &map, &pointer);
        resolver.exit_ref(parameter);
        value?
    };

    Ok(ParameterExample {
        name,
        location: param_in,
        required,
        value,
        pointer,
    })
}

/// Resolves a Header Object (or a reference to one) named `name`.
pub fn resolve_header(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'_>,
    name: &str,
    header: &Value,
    location: &str,
) -> AppResult<ParameterExample> {
    let resolved = resolver.deref(header, false);
    if is_circular(&resolved) {
        return Ok(ParameterExample {
            name: name.to_string(),
            location: "header".to_string(),
            required: false,
            value: None,
            pointer: location.to_string(),
        });
    }
    let pointer = ref_pointer(header).unwrap_or(location).to_string();
    let map = resolved.as_object().cloned().unwrap_or_default();
    let value = parameter_value(synth, resolver, &map, &pointer);
    resolver.exit_ref(header);

    Ok(ParameterExample {
        name: name.to_string(),
        location: "header".to_string(),
        required: map.get("required").and_then(Value::as_bool) == Some(true),
        value: value?,
        pointer,
    })
}

/// Returns the concrete value of a resolved parameter.
///
/// A missing value or a `"<type>"` placeholder is an
/// [`AppError::UnresolvedValue`] for this parameter only.
pub fn require_parameter_value(example: &ParameterExample) -> AppResult<&Value> {
    match &example.value {
        Some(value) if !is_placeholder(value) => Ok(value),
        _ => Err(AppError::UnresolvedValue {
            name: example.name.clone(),
            location: example.pointer.clone(),
        }),
    }
}

fn parameter_value(
    synth: &Synthesizer<'_>,
    resolver: &mut RefResolver<'_>,
    map: &Map<String, Value>,
    location: &str,
) -> AppResult<Option<Value>> {
    if let Some(example) = map.get("example").filter(|v| !v.is_null()) {
        return Ok(Some(example.clone()));
    }
    if let Some(Value::Object(named)) = map.get("examples") {
        if let Some(value) = named
            .values()
            .next()
            .and_then(|first| named_example_value(resolver, first))
        {
            return Ok(Some(value));
        }
    }
    if let Some(Value::Object(content)) = map.get("content") {
        if let Some((media_type, media)) = preferred_media_type(content) {
            let media_location = join_pointer(&join_pointer(location, "content"), media_type);
            if let Some(value) = media_example(synth, resolver, media, &media_location)? {
                return Ok(Some(value));
            }
        }
    }
    if let Some(schema) = map.get("schema") {
        return synth.synthesize(resolver, schema, &join_pointer(location, "schema"));
    }
    if map.contains_key("type") || map.contains_key("enum") || map.contains_key("default") {
        return synth.synthesize(resolver, &Value::Object(inline_schema(map)), location);
    }
    Ok(None)
}

/// The schema part of a Swagger 2 non-body parameter.
fn inline_schema(map: &Map<String, Value>) -> Map<String, Value> {
    const NOT_SCHEMA: [&str; 6] = [
        "name",
        "in",
        "required",
        "description",
        "collectionFormat",
        "allowEmptyValue",
    ];
    map.iter()
        .filter(|(key, _)| !NOT_SCHEMA.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
