#![deny(missing_docs)]

//! # Schema Normalization Module
//!
//! - **model**: The normalized, draft-04 shaped schema record.
//! - **merge**: `allOf` flattening with conflict rules.
//! - **normalize**: The recursive projection from raw to normalized schemas.

pub mod merge;
pub mod model;
pub mod normalize;

pub use merge::{merge_all_of, MergedSchema};
pub use model::{
    AdditionalProperties, NormalizedSchema, SchemaContext, SchemaItems, SchemaType,
    DRAFT_04_SCHEMA,
};
pub use normalize::{is_nullable, normalize_pointer, normalize_schema, resolve_type, Normalizer};
