#![deny(missing_docs)]

//! # Reference Resolver
//!
//! Dereferences `$ref` nodes against one in-memory document and tracks which
//! references are currently being expanded.
//!
//! A `RefResolver` is the per-traversal context: it owns the visit counters
//! and is created for exactly one top-level call (e.g. "normalize this
//! request body"). Two resolvers over the same document never share state.
//!
//! Contract: every non-circular [`RefResolver::deref`] of a reference must be
//! paired with exactly one [`RefResolver::exit_ref`] once the caller has
//! finished with the target's nested structure.

use crate::oas::pointer::{navigate, normalize_ref_to_local};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Keyword that marks a reference node.
pub const REF_KEY: &str = "$ref";

/// Keyword added to a target that was re-entered while already in flight.
pub const CIRCULAR_KEY: &str = "circular";

/// Returns true iff `node` carries a non-null string `$ref`.
pub fn is_ref(node: &Value) -> bool {
    ref_pointer(node).is_some()
}

/// Returns the raw `$ref` string of a reference node.
pub fn ref_pointer(node: &Value) -> Option<&str> {
    node.as_object()?.get(REF_KEY)?.as_str()
}

/// Returns true if `node` is an object flagged `circular: true`.
pub fn is_circular(node: &Value) -> bool {
    node.get(CIRCULAR_KEY).and_then(Value::as_bool) == Some(true)
}

/// Per-traversal reference resolution state.
pub struct RefResolver<'a> {
    document: &'a Value,
    self_uri: Option<String>,
    ref_budget: usize,
    visits: HashMap<String, usize>,
}

impl<'a> RefResolver<'a> {
    /// Creates a resolver with empty visit counters.
    ///
    /// The document's `$self` (if any) is used to recognise absolute
    /// references that point back into the same document.
    pub fn new(document: &'a Value) -> Self {
        let self_uri = document
            .get("$self")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            document,
            self_uri,
            ref_budget: count_refs(document),
            visits: HashMap::new(),
        }
    }

    /// The document this resolver walks.
    pub fn document(&self) -> &'a Value {
        self.document
    }

    /// Current in-flight count for a pointer (after normalization).
    pub fn visit_count(&self, pointer: &str) -> usize {
        self.visit_key(pointer)
            .and_then(|key| self.visits.get(&key).copied())
            .unwrap_or(0)
    }

    /// Returns true if no reference is currently held open.
    pub fn is_idle(&self) -> bool {
        self.visits.values().all(|count| *count == 0)
    }

    /// Resolves a pointer to the node it addresses.
    ///
    /// Missing targets, malformed pointers and references into other
    /// documents degrade to an empty (unconstrained) schema.
    pub fn by_ref(&self, pointer: &str) -> Value {
        match self.lookup(pointer) {
            Some(node) => node.clone(),
            None => {
                warn!(pointer, "reference target not found, using empty schema");
                Value::Object(Map::new())
            }
        }
    }

    /// Borrowing variant of [`RefResolver::by_ref`]; `None` when unresolvable.
    pub fn lookup(&self, pointer: &str) -> Option<&'a Value> {
        let local = normalize_ref_to_local(pointer, self.self_uri.as_deref())?;
        navigate(self.document, &local)
    }

    /// Follows a node through any chain of references without touching the
    /// visit counters. Used to peek at flags such as `readOnly`.
    pub fn peek<'n>(&self, node: &'n Value) -> &'n Value
    where
        'a: 'n,
    {
        let mut current = node;
        // A chain longer than the number of references in the document is a cycle.
        for _ in 0..=self.ref_budget {
            match ref_pointer(current).and_then(|p| self.lookup(p)) {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    /// Dereferences `node`.
    ///
    /// - Non-references are returned unchanged.
    /// - A reference already in flight returns its target flagged
    ///   `circular: true` without further expansion (unless `force_circular`).
    /// - Otherwise the visit count is incremented, and a target that is
    ///   itself a reference is dereferenced once and released immediately.
    ///   If that inner reference turns out circular, the outer count is
    ///   released too, so a circular result never holds a count.
    pub fn deref(&mut self, node: &Value, force_circular: bool) -> Value {
        let Some(pointer) = ref_pointer(node) else {
            return node.clone();
        };
        let target = self.by_ref(pointer);
        let key = self
            .visit_key(pointer)
            .unwrap_or_else(|| pointer.to_string());

        let in_flight = self.visits.get(&key).copied().unwrap_or(0);
        if in_flight > 0 && !force_circular {
            debug!(pointer, "circular reference, not expanding");
            return mark_circular(target);
        }

        *self.visits.entry(key).or_insert(0) += 1;
        trace!(pointer, depth = in_flight + 1, "entered reference");

        if is_ref(&target) {
            let inner = self.deref(&target, force_circular);
            if is_circular(&inner) {
                // Callers never release a circular result.
                self.exit_pointer(pointer);
            } else {
                self.exit_ref(&target);
            }
            return inner;
        }
        target
    }

    /// Releases a reference obtained through [`RefResolver::deref`].
    /// No-op for non-references.
    pub fn exit_ref(&mut self, node: &Value) {
        if let Some(pointer) = ref_pointer(node) {
            self.exit_pointer(pointer);
        }
    }

    /// Releases a reference by its pointer string.
    pub fn exit_pointer(&mut self, pointer: &str) {
        let key = self
            .visit_key(pointer)
            .unwrap_or_else(|| pointer.to_string());
        if let Some(count) = self.visits.get_mut(&key) {
            *count = count.saturating_sub(1);
            trace!(pointer, remaining = *count, "exited reference");
        }
    }

    fn visit_key(&self, pointer: &str) -> Option<String> {
        normalize_ref_to_local(pointer, self.self_uri.as_deref())
    }
}

/// Flags `target` as circular. Non-object targets collapse to `{circular: true}`.
fn mark_circular(target: Value) -> Value {
    let mut map = match target {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert(CIRCULAR_KEY.to_string(), Value::Bool(true));
    Value::Object(map)
}

fn count_refs(node: &Value) -> usize {
    match node {
        Value::Object(map) => {
            usize::from(map.contains_key(REF_KEY)) + map.values().map(count_refs).sum::<usize>()
        }
        Value::Array(items) => items.iter().map(count_refs).sum(),
        _ => 0,
    }
}
