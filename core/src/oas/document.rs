#![deny(missing_docs)]

//! # Document Loading
//!
//! Reads an already-bundled OpenAPI (or Swagger 2.0) document into a
//! `serde_json::Value` tree. YAML is a superset of JSON, so one parser
//! covers both encodings.

use crate::error::{AppError, AppResult};
use serde_json::Value;
use std::path::Path;

/// The dialect of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// OpenAPI 3.x (`openapi` root field). Schemas live under `#/components/schemas`.
    OpenApi3,
    /// Swagger 2.0 (`swagger` root field). Schemas live under `#/definitions`.
    Swagger2,
    /// A bare JSON Schema or fragment.
    Schema,
}

impl DocumentKind {
    /// Detects the dialect from root fields.
    pub fn detect(document: &Value) -> Self {
        if document.get("openapi").is_some() {
            DocumentKind::OpenApi3
        } else if document.get("swagger").is_some() {
            DocumentKind::Swagger2
        } else {
            DocumentKind::Schema
        }
    }

    /// Pointer of the named-schema section for this dialect.
    pub fn schemas_pointer(self) -> &'static str {
        match self {
            DocumentKind::Swagger2 => "#/definitions",
            _ => "#/components/schemas",
        }
    }
}

/// Parses a YAML or JSON document.
///
/// The root must be a mapping.
pub fn load_document(text: &str) -> AppResult<Value> {
    let document: Value = serde_yaml::from_str(text)?;
    if !document.is_object() {
        return Err(AppError::General(
            "Document root must be a mapping".to_string(),
        ));
    }
    Ok(document)
}

/// Reads and parses a document from disk.
pub fn load_document_file(path: &Path) -> AppResult<Value> {
    let text = std::fs::read_to_string(path)?;
    load_document(&text)
}
