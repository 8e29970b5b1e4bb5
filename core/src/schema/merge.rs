#![deny(missing_docs)]

//! # allOf Merging
//!
//! Flattens `allOf` composition into a single raw schema.
//!
//! Logic:
//! - Start from the schema without `allOf`, then fold every branch in order.
//! - Branches are dereferenced and have their own `allOf` merged first.
//! - Differing concrete `type`s are fatal. A branch type is adopted when the
//!   accumulator has none.
//! - `properties` are unioned; a name on both sides is merged through a
//!   synthetic two-branch `allOf`. `items` follow the same rule.
//! - `required` is a de-duplicated union.
//! - Any other keyword: the later branch wins.
//!
//! Every reference a branch came from stays in flight until the caller has
//! finished with the merged result, so the caller must release
//! [`MergedSchema::parent_refs`].

use crate::error::{AppError, AppResult};
use crate::oas::pointer::join_pointer;
use crate::oas::resolver::{is_circular, ref_pointer, RefResolver};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// A raw schema with its `allOf` folded away.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSchema {
    /// The merged schema (no top-level `allOf`).
    pub schema: Value,
    /// Pointers of the references entered while merging, still in flight.
    pub parent_refs: Vec<String>,
}

impl MergedSchema {
    /// Releases every parent reference held by this merge.
    pub fn release(&self, resolver: &mut RefResolver<'_>) {
        release_all(resolver, &self.parent_refs);
    }
}

/// Merges the `allOf` branches of `schema` (already dereferenced).
///
/// # Arguments
///
/// * `resolver` - Per-traversal resolution state.
/// * `schema` - The schema to flatten.
/// * `location` - Pointer of `schema`, used in conflict errors.
///
/// # Errors
///
/// [`AppError::TypeConflict`] when two branches declare different concrete
/// types. All references acquired by this call are released before the
/// error is returned.
pub fn merge_all_of(
    resolver: &mut RefResolver<'_>,
    schema: Value,
    location: &str,
) -> AppResult<MergedSchema> {
    let mut acc = match schema {
        Value::Object(map) if map.contains_key("allOf") => map,
        other => {
            return Ok(MergedSchema {
                schema: other,
                parent_refs: Vec::new(),
            })
        }
    };

    let branches = match acc.remove("allOf") {
        Some(Value::Array(branches)) => branches,
        _ => Vec::new(),
    };

    let mut parent_refs = Vec::new();
    let all_of_location = join_pointer(location, "allOf");
    for (index, branch) in branches.iter().enumerate() {
        let branch_location = join_pointer(&all_of_location, &index.to_string());
        let outcome = merge_branch(
            resolver,
            &mut acc,
            branch,
            &branch_location,
            location,
            &mut parent_refs,
        );
        if let Err(err) = outcome {
            release_all(resolver, &parent_refs);
            return Err(err);
        }
    }

    debug!(location, branches = branches.len(), "merged allOf");
    Ok(MergedSchema {
        schema: Value::Object(acc),
        parent_refs,
    })
}

fn merge_branch(
    resolver: &mut RefResolver<'_>,
    acc: &mut Map<String, Value>,
    branch: &Value,
    branch_location: &str,
    location: &str,
    parent_refs: &mut Vec<String>,
) -> AppResult<()> {
    let resolved = resolver.deref(branch, false);
    if is_circular(&resolved) {
        debug!(branch_location, "skipping circular allOf branch");
        return Ok(());
    }

    let pointer = ref_pointer(branch).map(str::to_string);
    if let Some(p) = &pointer {
        parent_refs.push(p.clone());
    }
    let origin = pointer.as_deref().unwrap_or(branch_location);

    let merged = merge_all_of(resolver, resolved, origin)?;
    parent_refs.extend(merged.parent_refs);

    match merged.schema {
        Value::Object(branch_map) => merge_into(resolver, acc, branch_map, location, parent_refs),
        _ => Ok(()),
    }
}

fn merge_into(
    resolver: &mut RefResolver<'_>,
    acc: &mut Map<String, Value>,
    branch: Map<String, Value>,
    location: &str,
    parent_refs: &mut Vec<String>,
) -> AppResult<()> {
    for (key, value) in branch {
        match key.as_str() {
            "type" => merge_type(acc, value, location)?,
            "properties" => {
                let incoming = match value {
                    Value::Object(incoming) => incoming,
                    other => {
                        acc.insert(key, other);
                        continue;
                    }
                };
                match acc.get_mut("properties") {
                    Some(Value::Object(existing)) => {
                        let props_location = join_pointer(location, "properties");
                        for (name, definition) in incoming {
                            let merged_definition = match existing.get(&name) {
                                Some(current) => {
                                    let prop_location = join_pointer(&props_location, &name);
                                    let merged = merge_pair(
                                        resolver,
                                        current.clone(),
                                        definition,
                                        &prop_location,
                                    )?;
                                    parent_refs.extend(merged.parent_refs);
                                    merged.schema
                                }
                                None => definition,
                            };
                            existing.insert(name, merged_definition);
                        }
                    }
                    _ => {
                        acc.insert(key, Value::Object(incoming));
                    }
                }
            }
            "items" => {
                let merged_items = match acc.get("items") {
                    Some(current) if current.is_object() && value.is_object() => {
                        let items_location = join_pointer(location, "items");
                        let merged =
                            merge_pair(resolver, current.clone(), value, &items_location)?;
                        parent_refs.extend(merged.parent_refs);
                        merged.schema
                    }
                    _ => value,
                };
                acc.insert(key, merged_items);
            }
            "required" => {
                let mut names: Vec<Value> = match acc.remove("required") {
                    Some(Value::Array(names)) => names,
                    _ => Vec::new(),
                };
                if let Value::Array(incoming) = value {
                    for name in incoming {
                        if !names.contains(&name) {
                            names.push(name);
                        }
                    }
                }
                acc.insert(key, Value::Array(names));
            }
            _ => {
                acc.insert(key, value);
            }
        }
    }
    Ok(())
}

/// Merges two definitions of the same member through a synthetic `allOf`.
fn merge_pair(
    resolver: &mut RefResolver<'_>,
    first: Value,
    second: Value,
    location: &str,
) -> AppResult<MergedSchema> {
    merge_all_of(resolver, json!({ "allOf": [first, second] }), location)
}

fn merge_type(acc: &mut Map<String, Value>, incoming: Value, location: &str) -> AppResult<()> {
    let incoming_concrete = !type_set(&incoming).is_empty();
    let existing = acc.get("type").filter(|t| !type_set(t).is_empty()).cloned();
    match existing {
        Some(existing) => {
            let differs = type_set(&existing) != type_set(&incoming);
            if incoming_concrete && differs {
                return Err(AppError::TypeConflict {
                    location: location.to_string(),
                    existing,
                    incoming,
                });
            }
        }
        None if incoming_concrete => {
            acc.insert("type".to_string(), incoming);
        }
        None => {}
    }
    Ok(())
}

/// The set of concrete type names in a raw `type` value.
fn type_set(value: &Value) -> BTreeSet<&str> {
    match value {
        Value::String(s) if !s.is_empty() => BTreeSet::from([s.as_str()]),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => BTreeSet::new(),
    }
}

fn release_all(resolver: &mut RefResolver<'_>, pointers: &[String]) {
    for pointer in pointers {
        resolver.exit_pointer(pointer);
    }
}
