#![deny(missing_docs)]

//! # JSON Pointer Navigation
//!
//! Turns `$ref` strings into document-local JSON Pointers and walks them.
//!
//! No external documents are ever fetched: a reference whose document part
//! matches the current document's `$self` URI is treated as local, anything
//! else pointing elsewhere is reported as unresolvable.

use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::path::Path;
use url::Url;

/// Normalizes a `$ref` to a local pointer of the form `#/a/b`.
///
/// - `#/a/b` and `#` pass through.
/// - `/a/b` and `a/b` gain the leading `#` marker.
/// - `doc.yaml#/a/b` is local only if `doc.yaml` matches `self_uri`.
///
/// Returns `None` for references into other documents.
pub fn normalize_ref_to_local(ref_str: &str, self_uri: Option<&str>) -> Option<String> {
    let ref_str = ref_str.trim();
    if ref_str.starts_with('#') {
        return Some(ref_str.to_string());
    }

    match ref_str.split_once('#') {
        Some(("", frag)) => Some(format!("#{}", frag)),
        Some((doc, frag)) => {
            let self_uri = self_uri?;
            if ref_doc_matches_self(doc, self_uri) {
                Some(format!("#{}", frag))
            } else {
                None
            }
        }
        None if ref_str.starts_with('/') => Some(format!("#{}", ref_str)),
        None if !ref_str.contains("://") && !ref_str.contains('.') => {
            Some(format!("#/{}", ref_str))
        }
        None => None,
    }
}

/// Splits a local pointer (`#/a/b`) into decoded reference tokens.
///
/// Each raw segment is percent-decoded first (pointers live in URI fragments),
/// then `~1` and `~0` are unescaped. Returns `None` if the pointer does not
/// start at the document root.
pub fn pointer_segments(pointer: &str) -> Option<Vec<String>> {
    let body = pointer.strip_prefix('#').unwrap_or(pointer);
    if body.is_empty() {
        return Some(Vec::new());
    }
    let body = body.strip_prefix('/')?;
    Some(body.split('/').map(decode_pointer_segment).collect())
}

/// Decodes a JSON Pointer segment (handles percent-encoding, `~1` and `~0`).
pub fn decode_pointer_segment(segment: &str) -> String {
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    decoded.replace("~1", "/").replace("~0", "~")
}

/// Encodes a single key so it can be appended to a pointer.
pub fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Appends one reference token to a pointer.
pub fn join_pointer(base: &str, segment: &str) -> String {
    format!("{}/{}", base, encode_pointer_segment(segment))
}

/// Walks `doc` along a local pointer.
///
/// Objects are entered by key and arrays by decimal index. Returns `None`
/// when any step is missing or the pointer is malformed.
pub fn navigate<'a>(doc: &'a Value, pointer: &str) -> Option<&'a Value> {
    let segments = pointer_segments(pointer)?;
    segments.iter().try_fold(doc, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn ref_doc_matches_self(ref_doc: &str, self_uri: &str) -> bool {
    if ref_doc == self_uri {
        return true;
    }

    if let (Ok(ref_url), Ok(self_url)) = (Url::parse(ref_doc), Url::parse(self_uri)) {
        return ref_url.scheme() == self_url.scheme()
            && ref_url.host() == self_url.host()
            && ref_url.port() == self_url.port()
            && ref_url.path() == self_url.path();
    }

    // `$self` given as an absolute path (e.g. "/api/openapi.yaml").
    if self_uri.starts_with('/') {
        if let Ok(ref_url) = Url::parse(ref_doc) {
            return ref_url.path() == self_uri;
        }
    }

    if !self_uri.contains("://") && !ref_doc.contains("://") {
        return Path::new(ref_doc) == Path::new(self_uri);
    }

    false
}
