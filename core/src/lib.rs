#![deny(missing_docs)]

//! # OAS Synth Core
//!
//! Reference resolution, schema normalization and example synthesis for
//! bundled OpenAPI 3.x and Swagger 2.0 documents.
//!
//! ```
//! use oas_synth_core::{normalize_pointer, synthesize_pointer, EngineOptions, SchemaContext};
//! use serde_json::json;
//!
//! let doc = json!({ "components": { "schemas": { "Id": { "type": "integer", "example": 7 } } } });
//! let options = EngineOptions::default();
//! let schema = normalize_pointer(&doc, "#/components/schemas/Id", SchemaContext::Other, &options).unwrap();
//! assert_eq!(schema.to_value()["type"], json!("integer"));
//! let value = synthesize_pointer(&doc, "#/components/schemas/Id", SchemaContext::Other, &options).unwrap();
//! assert_eq!(value, Some(json!(7)));
//! ```

/// Shared error types.
pub mod error;

/// Engine configuration.
pub mod options;

/// Document loading, JSON Pointers and `$ref` resolution.
pub mod oas;

/// `allOf` merging and draft-04 normalization.
pub mod schema;

/// Example value synthesis.
pub mod sample;

/// Operation-level entry points.
pub mod operation;

pub use error::{AppError, AppResult};
pub use oas::{load_document, load_document_file, DocumentKind, RefResolver};
pub use operation::{
    build_operation_fixture, list_operations, normalize_components, normalize_request_body,
    normalize_response_body, BodyExamples, OperationFixture, OperationRef, ResponseFixture,
};
pub use options::{EngineOptions, SynthesisOptions};
pub use sample::{
    collect_media_examples, media_example, require_parameter_value, resolve_normalized_value,
    synthesize_pointer, synthesize_schema, ParameterExample, Synthesizer,
};
pub use schema::{
    merge_all_of, normalize_pointer, normalize_schema, NormalizedSchema, Normalizer,
    SchemaContext, SchemaType,
};
