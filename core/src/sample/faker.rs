#![deny(missing_docs)]

//! # Schema Sampling
//!
//! Produces a random value that satisfies a schema's structural constraints.
//! This is the last resort of the example chain, used when a schema carries
//! no example data of its own.
//!
//! Honoured keywords: `type`, `enum`/`const` (first entry), `format`,
//! `pattern`, `minLength`/`maxLength`, `minimum`/`maximum` (inclusive and
//! exclusive, draft-04 and 2020-12 spellings), `multipleOf`,
//! `minItems`/`maxItems`/`uniqueItems`, `properties`, `oneOf`/`anyOf`
//! (first branch) and `allOf` (merged).
//!
//! The generator is seeded, so a given seed and document always produce the
//! same output.

use crate::error::AppResult;
use crate::oas::pointer::join_pointer;
use crate::oas::resolver::{is_circular, ref_pointer, RefResolver};
use crate::options::SynthesisOptions;
use crate::schema::merge::merge_all_of;
use crate::schema::model::SchemaContext;
use crate::schema::normalize::resolve_type;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use tracing::debug;

// 2000-01-01T00:00:00Z .. 2030-01-01T00:00:00Z
const EPOCH_RANGE: std::ops::Range<i64> = 946_684_800..1_893_456_000;
const DEFAULT_SPAN: i64 = 100;

/// Seeded, constraint-respecting value generator.
pub struct SchemaFaker<'o> {
    rng: StdRng,
    context: SchemaContext,
    options: &'o SynthesisOptions,
}

impl<'o> SchemaFaker<'o> {
    /// Creates a sampler seeded from `options.seed`.
    pub fn new(context: SchemaContext, options: &'o SynthesisOptions) -> Self {
        Self {
            rng: StdRng::seed_from_u64(options.seed),
            context,
            options,
        }
    }

    /// Samples a value for `node`. `None` for unconstrained schemas and
    /// for re-entered references.
    pub fn sample(
        &mut self,
        resolver: &mut RefResolver<'_>,
        node: &Value,
        location: &str,
    ) -> AppResult<Option<Value>> {
        let resolved = resolver.deref(node, false);
        if is_circular(&resolved) {
            return Ok(None);
        }
        let location = ref_pointer(node).unwrap_or(location).to_string();
        let result = self.sample_resolved(resolver, resolved, &location);
        resolver.exit_ref(node);
        result
    }

    fn sample_resolved(
        &mut self,
        resolver: &mut RefResolver<'_>,
        schema: Value,
        location: &str,
    ) -> AppResult<Option<Value>> {
        let merged = merge_all_of(resolver, schema, location)?;
        let result = match &merged.schema {
            Value::Object(map) => self.sample_map(resolver, map, location),
            _ => Ok(None),
        };
        merged.release(resolver);
        result
    }

    fn sample_map(
        &mut self,
        resolver: &mut RefResolver<'_>,
        map: &Map<String, Value>,
        location: &str,
    ) -> AppResult<Option<Value>> {
        if let Some(constant) = map.get("const") {
            return Ok(Some(constant.clone()));
        }
        if let Some(Value::Array(values)) = map.get("enum") {
            if let Some(first) = values.first() {
                return Ok(Some(first.clone()));
            }
        }
        for keyword in ["oneOf", "anyOf"] {
            if let Some(Value::Array(branches)) = map.get(keyword) {
                if let Some(first) = branches.first() {
                    let branch_location = join_pointer(&join_pointer(location, keyword), "0");
                    return self.sample(resolver, first, &branch_location);
                }
            }
        }

        let Some(schema_type) = resolve_type(map) else {
            return Ok(None);
        };
        let value = match schema_type.primary() {
            "string" => Some(Value::String(self.sample_string(map))),
            "integer" => Some(self.sample_integer(map)),
            "number" => Some(self.sample_number(map)),
            "boolean" => Some(Value::Bool(self.rng.gen())),
            "null" => Some(Value::Null),
            "array" => Some(self.sample_array(resolver, map, location)?),
            "object" => Some(self.sample_object(resolver, map, location)?),
            other => {
                debug!(location, schema_type = other, "unknown type, not sampling");
                None
            }
        };
        Ok(value)
    }

    fn sample_string(&mut self, map: &Map<String, Value>) -> String {
        if let Some(format) = map.get("format").and_then(Value::as_str) {
            if let Some(value) = self.sample_format(format) {
                return value;
            }
        }
        if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
            if let Some(value) = self.sample_pattern(pattern) {
                return value;
            }
        }

        let declared_max = map.get("maxLength").and_then(Value::as_u64).map(|m| m as usize);
        let min = map
            .get("minLength")
            .and_then(Value::as_u64)
            .map(|m| m as usize)
            .unwrap_or_else(|| declared_max.unwrap_or(1).min(1));
        let max = declared_max.unwrap_or_else(|| self.options.max_string_length.max(min));
        let len = if min >= max {
            min
        } else {
            self.rng.gen_range(min..=max)
        };
        self.alphanumeric(len)
    }

    fn sample_format(&mut self, format: &str) -> Option<String> {
        let value = match format {
            "date-time" => self
                .random_instant()?
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            "date" => self.random_instant()?.format("%Y-%m-%d").to_string(),
            "time" => self.random_instant()?.format("%H:%M:%S").to_string(),
            "email" => format!("{}@example.com", self.alphanumeric(8).to_lowercase()),
            "uuid" => uuid::Builder::from_random_bytes(self.rng.gen())
                .into_uuid()
                .to_string(),
            "uri" | "url" => format!("https://example.com/{}", self.alphanumeric(6).to_lowercase()),
            "hostname" => format!("{}.example.com", self.alphanumeric(6).to_lowercase()),
            "ipv4" => {
                let octets: [u8; 4] = self.rng.gen();
                std::net::Ipv4Addr::from(octets).to_string()
            }
            "ipv6" => {
                let segments: [u16; 8] = self.rng.gen();
                std::net::Ipv6Addr::from(segments).to_string()
            }
            _ => return None,
        };
        Some(value)
    }

    fn sample_pattern(&mut self, pattern: &str) -> Option<String> {
        // The generator rejects anchors; patterns are matched unanchored anyway.
        let trimmed = pattern.strip_prefix('^').unwrap_or(pattern);
        let trimmed = match trimmed.strip_suffix('$') {
            Some(rest) if !rest.ends_with('\\') => rest,
            _ => trimmed,
        };
        match rand_regex::Regex::compile(trimmed, self.options.max_pattern_repeat) {
            Ok(generator) => Some(self.rng.sample::<String, _>(&generator)),
            Err(err) => {
                debug!(pattern, error = %err, "pattern not sampleable");
                None
            }
        }
    }

    fn sample_integer(&mut self, map: &Map<String, Value>) -> Value {
        let lower = lower_bound(map).map(|(v, exclusive)| {
            if exclusive {
                (v.floor() as i64).saturating_add(1)
            } else {
                v.ceil() as i64
            }
        });
        let upper = upper_bound(map).map(|(v, exclusive)| {
            if exclusive {
                (v.ceil() as i64).saturating_sub(1)
            } else {
                v.floor() as i64
            }
        });
        let (lo, hi) = match (lower, upper) {
            (Some(lo), Some(hi)) => (lo, hi),
            (Some(lo), None) => (lo, lo.saturating_add(DEFAULT_SPAN)),
            (None, Some(hi)) => (hi.saturating_sub(DEFAULT_SPAN).max(hi.min(0)), hi),
            (None, None) => (0, DEFAULT_SPAN),
        };
        if lo > hi {
            return json!(lo);
        }

        let step = map
            .get("multipleOf")
            .and_then(Value::as_f64)
            .filter(|m| *m >= 1.0 && m.fract() == 0.0)
            .map(|m| m as i64);
        if let Some(step) = step {
            let first = (lo as f64 / step as f64).ceil() as i64;
            let last = (hi as f64 / step as f64).floor() as i64;
            if first <= last {
                return json!(self.rng.gen_range(first..=last) * step);
            }
        }
        json!(self.rng.gen_range(lo..=hi))
    }

    fn sample_number(&mut self, map: &Map<String, Value>) -> Value {
        let lower = lower_bound(map);
        let upper = upper_bound(map);
        let lo = lower.map(|(v, _)| v).unwrap_or_else(|| {
            upper.map(|(v, _)| v - DEFAULT_SPAN as f64).unwrap_or(0.0).min(0.0)
        });
        let hi = upper
            .map(|(v, _)| v)
            .unwrap_or(lo + DEFAULT_SPAN as f64);
        if lo >= hi {
            return json!(lo);
        }

        if let Some(step) = map
            .get("multipleOf")
            .and_then(Value::as_f64)
            .filter(|m| *m > 0.0)
        {
            let mut first = (lo / step).ceil() as i64;
            let mut last = (hi / step).floor() as i64;
            if lower.map(|(_, exclusive)| exclusive).unwrap_or(false) && first as f64 * step <= lo {
                first += 1;
            }
            if upper.map(|(_, exclusive)| exclusive).unwrap_or(false) && last as f64 * step >= hi {
                last -= 1;
            }
            if first <= last {
                return json!(self.rng.gen_range(first..=last) as f64 * step);
            }
        }

        // Interpolate instead of `gen_range`, whose span overflows near f64::MAX.
        let t: f64 = self.rng.gen();
        let raw = lo * (1.0 - t) + hi * t;
        let rounded = (raw * 100.0).round() / 100.0;
        let value = if rounded.is_finite() && rounded > lo && rounded < hi {
            rounded
        } else {
            lo / 2.0 + hi / 2.0
        };
        json!(value)
    }

    fn sample_array(
        &mut self,
        resolver: &mut RefResolver<'_>,
        map: &Map<String, Value>,
        location: &str,
    ) -> AppResult<Value> {
        let items_location = join_pointer(location, "items");
        if let Some(Value::Array(tuple)) = map.get("items") {
            let mut values = Vec::with_capacity(tuple.len());
            for (i, item) in tuple.iter().enumerate() {
                let location = join_pointer(&items_location, &i.to_string());
                values.push(self.sample(resolver, item, &location)?.unwrap_or(Value::Null));
            }
            return Ok(Value::Array(values));
        }

        let min = map.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        let max = map
            .get("maxItems")
            .and_then(Value::as_u64)
            .map(|m| m as usize)
            .unwrap_or_else(|| self.options.max_array_items.max(min));
        let count = min.max(1).min(max);
        let unique = map.get("uniqueItems").and_then(Value::as_bool) == Some(true);

        let Some(items) = map.get("items") else {
            return Ok(Value::Array(Vec::new()));
        };
        let mut values: Vec<Value> = Vec::with_capacity(count);
        // Duplicates are retried a bounded number of times.
        let mut attempts = count * 4;
        while values.len() < count && attempts > 0 {
            attempts -= 1;
            let Some(value) = self.sample(resolver, items, &items_location)? else {
                break;
            };
            if unique && values.contains(&value) {
                continue;
            }
            values.push(value);
        }
        Ok(Value::Array(values))
    }

    fn sample_object(
        &mut self,
        resolver: &mut RefResolver<'_>,
        map: &Map<String, Value>,
        location: &str,
    ) -> AppResult<Value> {
        let mut object = Map::new();
        if let Some(Value::Object(properties)) = map.get("properties") {
            let props_location = join_pointer(location, "properties");
            for (name, property) in properties {
                if self.context.hides(resolver.peek(property)) {
                    continue;
                }
                let prop_location = join_pointer(&props_location, name);
                if let Some(value) = self.sample(resolver, property, &prop_location)? {
                    object.insert(name.clone(), value);
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn random_instant(&mut self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.rng.gen_range(EPOCH_RANGE), 0)
    }
}

/// `(bound, exclusive)` for the lower end of a numeric range.
fn lower_bound(map: &Map<String, Value>) -> Option<(f64, bool)> {
    bound(map, "minimum", "exclusiveMinimum")
}

/// `(bound, exclusive)` for the upper end of a numeric range.
fn upper_bound(map: &Map<String, Value>) -> Option<(f64, bool)> {
    bound(map, "maximum", "exclusiveMaximum")
}

fn bound(map: &Map<String, Value>, inclusive_key: &str, exclusive_key: &str) -> Option<(f64, bool)> {
    let inclusive = map.get(inclusive_key).and_then(Value::as_f64);
    match (inclusive, map.get(exclusive_key)) {
        (_, Some(Value::Number(n))) => n.as_f64().map(|v| (v, true)),
        (Some(v), Some(Value::Bool(exclusive))) => Some((v, *exclusive)),
        (Some(v), _) => Some((v, false)),
        (None, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_with(schema: Value, seed: u64) -> Option<Value> {
        let doc = json!({});
        let options = SynthesisOptions {
            seed,
            ..SynthesisOptions::default()
        };
        let mut resolver = RefResolver::new(&doc);
        let value = SchemaFaker::new(SchemaContext::Other, &options)
            .sample(&mut resolver, &schema, "#")
            .unwrap();
        assert!(resolver.is_idle());
        value
    }

    fn sample(schema: Value) -> Option<Value> {
        sample_with(schema, 0)
    }

    #[test]
    fn test_same_seed_same_value() {
        let schema = json!({ "type": "string", "minLength": 5, "maxLength": 12 });
        assert_eq!(sample_with(schema.clone(), 9), sample_with(schema, 9));
    }

    #[test]
    fn test_string_length_bounds() {
        for seed in 0..20 {
            let value = sample_with(json!({ "type": "string", "minLength": 3, "maxLength": 6 }), seed)
                .unwrap();
            let len = value.as_str().unwrap().len();
            assert!((3..=6).contains(&len), "length {len}");
        }
    }

    #[test]
    fn test_pattern_honoured() {
        for seed in 0..10 {
            let value = sample_with(json!({ "type": "string", "pattern": "^[A-Z]{3}-[0-9]{2}$" }), seed)
                .unwrap();
            let s = value.as_str().unwrap();
            assert_eq!(s.len(), 6, "{s}");
            assert!(s[..3].chars().all(|c| c.is_ascii_uppercase()), "{s}");
            assert_eq!(&s[3..4], "-");
            assert!(s[4..].chars().all(|c| c.is_ascii_digit()), "{s}");
        }
    }

    #[test]
    fn test_formats() {
        let uuid = sample(json!({ "type": "string", "format": "uuid" })).unwrap();
        assert!(uuid::Uuid::parse_str(uuid.as_str().unwrap()).is_ok());

        let stamp = sample(json!({ "type": "string", "format": "date-time" })).unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp.as_str().unwrap()).is_ok());

        let date = sample(json!({ "type": "string", "format": "date" })).unwrap();
        assert!(chrono::NaiveDate::parse_from_str(date.as_str().unwrap(), "%Y-%m-%d").is_ok());

        let email = sample(json!({ "type": "string", "format": "email" })).unwrap();
        assert!(email.as_str().unwrap().ends_with("@example.com"));

        let ip = sample(json!({ "type": "string", "format": "ipv4" })).unwrap();
        assert!(ip.as_str().unwrap().parse::<std::net::Ipv4Addr>().is_ok());
    }

    #[test]
    fn test_integer_bounds_and_multiple() {
        for seed in 0..30 {
            let value = sample_with(
                json!({ "type": "integer", "minimum": 10, "maximum": 50, "multipleOf": 7 }),
                seed,
            )
            .unwrap()
            .as_i64()
            .unwrap();
            assert!((10..=50).contains(&value) && value % 7 == 0, "{value}");
        }
    }

    #[test]
    fn test_exclusive_bounds_both_dialects() {
        for seed in 0..30 {
            let draft4 = sample_with(
                json!({ "type": "integer", "minimum": 1, "exclusiveMinimum": true,
                        "maximum": 3, "exclusiveMaximum": true }),
                seed,
            )
            .unwrap();
            assert_eq!(draft4, json!(2));

            let modern = sample_with(
                json!({ "type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 1 }),
                seed,
            )
            .unwrap()
            .as_f64()
            .unwrap();
            assert!(modern > 0.0 && modern < 1.0, "{modern}");
        }
    }

    #[test]
    fn test_number_extreme_bounds() {
        let value = sample(json!({ "type": "number", "minimum": -1.7e308, "maximum": 1.7e308 }))
            .unwrap();
        let n = value.as_f64().unwrap();
        assert!(n.is_finite());
        assert!((-1.7e308..=1.7e308).contains(&n));

        let value = sample(json!({
            "type": "integer",
            "minimum": -1.0e300,
            "maximum": 1.0e300,
            "exclusiveMinimum": true,
            "exclusiveMaximum": true
        }))
        .unwrap();
        assert!(value.is_i64());
    }

    #[test]
    fn test_array_size_and_uniqueness() {
        let value = sample(json!({
            "type": "array",
            "minItems": 2,
            "maxItems": 2,
            "uniqueItems": true,
            "items": { "type": "integer", "minimum": 0, "maximum": 1000 }
        }))
        .unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0], items[1]);
    }

    #[test]
    fn test_object_and_one_of() {
        let value = sample(json!({
            "oneOf": [
                { "type": "object", "properties": { "ok": { "type": "boolean" } } },
                { "type": "string" }
            ]
        }))
        .unwrap();
        assert!(value["ok"].is_boolean());
    }

    #[test]
    fn test_enum_and_const_take_first() {
        assert_eq!(sample(json!({ "type": "string", "enum": ["x", "y"] })), Some(json!("x")));
        assert_eq!(sample(json!({ "const": 4 })), Some(json!(4)));
    }

    #[test]
    fn test_unconstrained_is_none() {
        assert_eq!(sample(json!({})), None);
        assert_eq!(sample(json!({ "description": "free-form" })), None);
    }

    #[test]
    fn test_circular_items_stop() {
        let doc = json!({
            "components": { "schemas": { "List": {
                "type": "array",
                "items": { "$ref": "#/components/schemas/List" }
            } } }
        });
        let options = SynthesisOptions::default();
        let mut resolver = RefResolver::new(&doc);
        let value = SchemaFaker::new(SchemaContext::Other, &options)
            .sample(&mut resolver, &json!({ "$ref": "#/components/schemas/List" }), "#")
            .unwrap()
            .unwrap();
        assert!(value.is_array());
        assert!(resolver.is_idle());
    }
}
