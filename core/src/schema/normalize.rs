#![deny(missing_docs)]

//! # Schema Normalization
//!
//! Projects a raw OpenAPI Schema Object onto [`NormalizedSchema`].
//!
//! Order of operations for every node:
//! 1. Dereference; a re-entered reference becomes `{circular: true}`.
//! 2. Merge `allOf`.
//! 3. Copy allow-listed keywords.
//! 4. Resolve `type` (explicit, else inferred) and widen for `nullable`.
//! 5. Copy `enum`, appending `null` for nullable single-typed schemas.
//! 6. Reduce `discriminator` to its property name.
//! 7. Recurse into `oneOf`, `anyOf`, `not`, `items`, `additionalProperties`.
//! 8. Recurse into `properties`, dropping those hidden in the context.
//! 9. Release the node's reference and the merge's parent references.

use crate::error::AppResult;
use crate::oas::pointer::join_pointer;
use crate::oas::resolver::{is_circular, ref_pointer, RefResolver};
use crate::options::EngineOptions;
use crate::schema::merge::merge_all_of;
use crate::schema::model::{
    AdditionalProperties, NormalizedSchema, SchemaContext, SchemaItems, SchemaType,
    DRAFT_04_SCHEMA,
};
use indexmap::IndexMap;
use serde_json::{json, Map, Number, Value};

const OBJECT_HINTS: &[&str] = &["properties", "additionalProperties", "required"];
const ARRAY_HINTS: &[&str] = &["items", "minItems", "maxItems", "uniqueItems"];
const NUMBER_HINTS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
];
const STRING_HINTS: &[&str] = &["minLength", "maxLength", "pattern"];

/// Returns the declared `type`, or one inferred from type-indicating keywords.
///
/// Inference is a best-effort heuristic for loosely typed sources: object
/// hints win over array hints, which win over numeric and string hints.
pub fn resolve_type(schema: &Map<String, Value>) -> Option<SchemaType> {
    if let Some(declared) = schema.get("type").and_then(SchemaType::from_value) {
        return Some(declared);
    }
    let has_any = |keys: &[&str]| keys.iter().any(|k| schema.contains_key(*k));
    let inferred = if has_any(OBJECT_HINTS) {
        "object"
    } else if has_any(ARRAY_HINTS) {
        "array"
    } else if has_any(NUMBER_HINTS) {
        "number"
    } else if has_any(STRING_HINTS) {
        "string"
    } else {
        return None;
    };
    Some(SchemaType::Single(inferred.to_string()))
}

/// Returns true if the schema is flagged `nullable` (or Swagger's `x-nullable`).
pub fn is_nullable(schema: &Map<String, Value>) -> bool {
    ["nullable", "x-nullable"]
        .iter()
        .any(|k| schema.get(*k).and_then(Value::as_bool) == Some(true))
}

/// Recursive normalizer for one projection context.
pub struct Normalizer<'o> {
    context: SchemaContext,
    options: &'o EngineOptions,
}

impl<'o> Normalizer<'o> {
    /// Creates a normalizer projecting for `context`.
    pub fn new(context: SchemaContext, options: &'o EngineOptions) -> Self {
        Self { context, options }
    }

    /// Normalizes a schema or reference node.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Per-traversal resolution state.
    /// * `node` - The raw schema or `$ref` node.
    /// * `location` - Pointer of `node`, used in error messages when the node
    ///   is inline.
    pub fn normalize(
        &self,
        resolver: &mut RefResolver<'_>,
        node: &Value,
        location: &str,
    ) -> AppResult<NormalizedSchema> {
        let resolved = resolver.deref(node, false);
        // A circular result never incremented a counter, so there is nothing to release.
        if is_circular(&resolved) {
            return Ok(NormalizedSchema::circular());
        }

        let location = ref_pointer(node).unwrap_or(location).to_string();
        let result = self.normalize_resolved(resolver, resolved, &location);
        resolver.exit_ref(node);
        result
    }

    fn normalize_resolved(
        &self,
        resolver: &mut RefResolver<'_>,
        schema: Value,
        location: &str,
    ) -> AppResult<NormalizedSchema> {
        let merged = merge_all_of(resolver, schema, location)?;
        let result = match &merged.schema {
            Value::Object(map) => self.build(resolver, map, location),
            // Boolean and other non-object schemas are unconstrained.
            _ => Ok(NormalizedSchema::default()),
        };
        merged.release(resolver);
        result
    }

    fn build(
        &self,
        resolver: &mut RefResolver<'_>,
        map: &Map<String, Value>,
        location: &str,
    ) -> AppResult<NormalizedSchema> {
        let mut out = NormalizedSchema::default();
        self.copy_allowed(map, &mut out);

        let nullable = is_nullable(map);
        let mut schema_type = resolve_type(map);
        let single_typed = matches!(schema_type, Some(SchemaType::Single(_)));
        if nullable {
            if let Some(SchemaType::Single(name)) = &schema_type {
                if name != "null" {
                    schema_type = Some(SchemaType::Union(vec![name.clone(), "null".into()]));
                }
            }
        }
        out.schema_type = schema_type;

        if let Some(Value::Array(values)) = map.get("enum") {
            let mut values = values.clone();
            if nullable && single_typed && !values.contains(&Value::Null) {
                values.push(Value::Null);
            }
            out.enum_values = Some(values);
        }

        out.discriminator = match map.get("discriminator") {
            Some(Value::String(name)) => Some(name.clone()),
            Some(Value::Object(d)) => d
                .get("propertyName")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };

        out.one_of = self.normalize_list(resolver, map.get("oneOf"), location, "oneOf")?;
        out.any_of = self.normalize_list(resolver, map.get("anyOf"), location, "anyOf")?;
        if let Some(not) = map.get("not") {
            let schema = self.normalize(resolver, not, &join_pointer(location, "not"))?;
            out.not = Some(Box::new(schema));
        }
        out.items = match map.get("items") {
            Some(Value::Array(_)) => self
                .normalize_list(resolver, map.get("items"), location, "items")?
                .map(SchemaItems::Tuple),
            Some(items) => {
                let schema = self.normalize(resolver, items, &join_pointer(location, "items"))?;
                Some(SchemaItems::Single(Box::new(schema)))
            }
            None => None,
        };
        out.additional_properties = match map.get("additionalProperties") {
            Some(Value::Bool(flag)) => Some(AdditionalProperties::Allowed(*flag)),
            Some(schema) => {
                let location = join_pointer(location, "additionalProperties");
                let schema = self.normalize(resolver, schema, &location)?;
                Some(AdditionalProperties::Schema(Box::new(schema)))
            }
            None => None,
        };

        let mut hidden = Vec::new();
        if let Some(Value::Object(properties)) = map.get("properties") {
            let props_location = join_pointer(location, "properties");
            let mut normalized = IndexMap::with_capacity(properties.len());
            for (name, property) in properties {
                if self.context.hides(resolver.peek(property)) {
                    hidden.push(name.as_str());
                    continue;
                }
                let prop_location = join_pointer(&props_location, name);
                normalized.insert(
                    name.clone(),
                    self.normalize(resolver, property, &prop_location)?,
                );
            }
            out.properties = Some(normalized);
        }

        if let Some(Value::Array(required)) = map.get("required") {
            let names: Vec<String> = required
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| !hidden.contains(name))
                .map(str::to_string)
                .collect();
            out.required = (!names.is_empty()).then_some(names);
        }

        Ok(out)
    }

    fn normalize_list(
        &self,
        resolver: &mut RefResolver<'_>,
        list: Option<&Value>,
        location: &str,
        keyword: &str,
    ) -> AppResult<Option<Vec<NormalizedSchema>>> {
        let Some(Value::Array(items)) = list else {
            return Ok(None);
        };
        let list_location = join_pointer(location, keyword);
        let normalized = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.normalize(resolver, item, &join_pointer(&list_location, &i.to_string()))
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Some(normalized))
    }

    fn copy_allowed(&self, map: &Map<String, Value>, out: &mut NormalizedSchema) {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| match map.get(key) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };
        let count = |key: &str| map.get(key).and_then(Value::as_u64);
        let present = |key: &str| map.get(key).filter(|v| !v.is_null()).cloned();

        out.title = text("title");
        out.description = text("description");
        out.format = text("format");
        out.pattern = text("pattern");
        out.default = present("default");
        out.xml = present("xml");

        out.multiple_of = number("multipleOf");
        out.maximum = number("maximum");
        out.minimum = number("minimum");
        out.exclusive_maximum = exclusive_bound(map.get("exclusiveMaximum"));
        out.exclusive_minimum = exclusive_bound(map.get("exclusiveMinimum"));

        out.max_length = count("maxLength");
        out.min_length = count("minLength");
        out.max_items = count("maxItems");
        out.min_items = count("minItems");
        out.max_properties = count("maxProperties");
        out.min_properties = count("minProperties");
        out.unique_items = map.get("uniqueItems").and_then(Value::as_bool);
        out.circular = map.get("circular").and_then(Value::as_bool);

        for (key, value) in map {
            if self.options.preserves(key) {
                out.extensions.insert(key.clone(), value.clone());
            }
        }
    }
}

/// `exclusiveMinimum`/`exclusiveMaximum` are booleans in draft-04 and numbers
/// in later dialects; both shapes are kept.
fn exclusive_bound(value: Option<&Value>) -> Option<Value> {
    match value {
        Some(Value::Bool(flag)) => Some(Value::Bool(*flag)),
        Some(Value::Number(n)) => Some(Value::Number(Number::clone(n))),
        _ => None,
    }
}

/// Normalizes a schema node of `document` in its own traversal and tags the
/// root with the draft-04 `$schema` URI.
///
/// # Arguments
///
/// * `document` - The bundled document the node's references point into.
/// * `node` - A schema or `$ref` node.
/// * `location` - Pointer of `node` (for error messages).
/// * `context` - Request/response projection.
/// * `options` - Engine configuration.
pub fn normalize_schema(
    document: &Value,
    node: &Value,
    location: &str,
    context: SchemaContext,
    options: &EngineOptions,
) -> AppResult<NormalizedSchema> {
    let mut resolver = RefResolver::new(document);
    let mut schema = Normalizer::new(context, options).normalize(&mut resolver, node, location)?;
    schema.schema_uri = Some(DRAFT_04_SCHEMA.to_string());
    Ok(schema)
}

/// Normalizes the schema found at `pointer` in `document`.
///
/// The pointer is entered as a reference, so a schema that refers back to
/// itself is cut at its first re-entry.
pub fn normalize_pointer(
    document: &Value,
    pointer: &str,
    context: SchemaContext,
    options: &EngineOptions,
) -> AppResult<NormalizedSchema> {
    normalize_schema(document, &json!({ "$ref": pointer }), pointer, context, options)
}
