#![deny(missing_docs)]

//! # Example Synthesis Module
//!
//! - **chain**: The deterministic example priority chain for schemas.
//! - **faker**: Seeded random sampling used when the chain finds nothing.
//! - **params**: Parameter and header values.
//! - **media**: Media Type Object examples.

pub mod chain;
pub mod faker;
pub mod media;
pub mod params;

pub use chain::{
    is_placeholder, placeholder_for, resolve_normalized_value, synthesize_pointer,
    synthesize_schema, Synthesizer,
};
pub use faker::SchemaFaker;
pub use media::{collect_media_examples, media_example, preferred_media_type};
pub use params::{require_parameter_value, resolve_header, resolve_parameter, ParameterExample};
