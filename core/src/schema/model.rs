#![deny(missing_docs)]

//! # Normalized Schema Model
//!
//! The JSON-Schema draft-04 projection produced by the normalizer.
//!
//! Only the keywords listed as fields here survive normalization; there is no
//! open "bag of extra properties". Vendor extensions that the configuration
//! explicitly preserves travel in [`NormalizedSchema::extensions`], which is
//! never serialized inline.

use crate::error::AppError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// `$schema` URI attached to the root of every normalized tree.
pub const DRAFT_04_SCHEMA: &str = "http://json-schema.org/draft-04/schema#";

/// Which side of an exchange a schema is projected for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaContext {
    /// Request payloads: `readOnly` properties are hidden.
    Request,
    /// Response payloads: `writeOnly` properties are hidden.
    Response,
    /// No projection.
    #[default]
    Other,
}

impl SchemaContext {
    /// Returns true if a property schema carrying these flags is invisible
    /// in this context.
    pub fn hides(self, property: &Value) -> bool {
        let flag = |key: &str| property.get(key).and_then(Value::as_bool) == Some(true);
        match self {
            SchemaContext::Request => flag("readOnly"),
            SchemaContext::Response => flag("writeOnly"),
            SchemaContext::Other => false,
        }
    }
}

impl FromStr for SchemaContext {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "request" => Ok(SchemaContext::Request),
            "response" => Ok(SchemaContext::Response),
            "other" => Ok(SchemaContext::Other),
            other => Err(AppError::General(format!(
                "Unknown schema context '{}' (expected request, response or other)",
                other
            ))),
        }
    }
}

impl fmt::Display for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaContext::Request => "request",
            SchemaContext::Response => "response",
            SchemaContext::Other => "other",
        };
        f.write_str(name)
    }
}

/// The `type` keyword: a single type name or a set of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// `type: "string"`
    Single(String),
    /// `type: ["string", "null"]`
    Union(Vec<String>),
}

impl SchemaType {
    /// Parses a raw `type` value. Anything but a string or a non-empty array
    /// of strings is treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(SchemaType::Single(s.clone())),
            Value::Array(items) => {
                let names: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    None
                } else {
                    Some(SchemaType::Union(names))
                }
            }
            _ => None,
        }
    }

    /// The first non-null type name (`"null"` if that is all there is).
    pub fn primary(&self) -> &str {
        match self {
            SchemaType::Single(s) => s,
            SchemaType::Union(names) => names
                .iter()
                .find(|n| n.as_str() != "null")
                .or_else(|| names.first())
                .map(String::as_str)
                .unwrap_or("null"),
        }
    }
}

/// The `items` keyword: one schema for every element, or a tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaItems {
    /// Positional item schemas.
    Tuple(Vec<NormalizedSchema>),
    /// A schema applied to every element.
    Single(Box<NormalizedSchema>),
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` / `false`.
    Allowed(bool),
    /// A schema for every extra property.
    Schema(Box<NormalizedSchema>),
}

/// A normalized, reference-free, `allOf`-free schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizedSchema {
    /// Dialect URI; set on the root only.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared or inferred type, widened with `"null"` for nullable schemas.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Format hint (`date-time`, `uuid`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Name of the property selecting a polymorphic sub-type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    /// `multipleOf`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    /// `maximum`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// `exclusiveMaximum` (boolean in draft-04, number in newer dialects).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Value>,
    /// `minimum`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// `exclusiveMinimum` (boolean in draft-04, number in newer dialects).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Value>,
    /// `maxLength`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// `minLength`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// `pattern`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `maxItems`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// `minItems`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// `uniqueItems`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    /// `maxProperties`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    /// `minProperties`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    /// XML serialization metadata, copied as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<Value>,

    /// Member schemas, in declaration order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, NormalizedSchema>>,
    /// Required property names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Schema or flag for undeclared properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    /// Array element schema(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<SchemaItems>,
    /// `oneOf` branches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<NormalizedSchema>>,
    /// `anyOf` branches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<NormalizedSchema>>,
    /// `not` schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<NormalizedSchema>>,

    /// Set where expansion stopped on a re-entered reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circular: Option<bool>,

    /// Vendor extensions kept by configuration. Not serialized.
    #[serde(skip)]
    pub extensions: BTreeMap<String, Value>,
}

impl NormalizedSchema {
    /// The leaf emitted in place of a re-entered reference.
    pub fn circular() -> Self {
        Self {
            circular: Some(true),
            ..Self::default()
        }
    }

    /// Returns true for the circular leaf.
    pub fn is_circular(&self) -> bool {
        self.circular == Some(true)
    }

    /// Serializes into a `serde_json::Value`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
