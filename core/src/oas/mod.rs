#![deny(missing_docs)]

//! # OpenAPI Document Access
//!
//! - **document**: Loading an already-bundled document into memory.
//! - **pointer**: JSON Pointer normalization and navigation.
//! - **resolver**: `$ref` dereferencing with cycle detection.

pub mod document;
pub mod pointer;
pub mod resolver;

pub use document::{load_document, load_document_file, DocumentKind};
pub use resolver::{is_circular, is_ref, RefResolver};
