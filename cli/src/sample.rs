#![deny(missing_docs)]

//! # Sample Command
//!
//! Prints an example value for the schema at a pointer.

use std::io::Write;

use oas_synth_core::{synthesize_pointer, SchemaContext};
use serde_json::Value;
use tracing::warn;

use crate::args::{write_json, InputArgs};
use crate::error::CliResult;

/// Arguments for the sample command.
#[derive(clap::Args, Debug, Clone)]
pub struct SampleArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// JSON Pointer of the schema, e.g. `#/components/schemas/Pet`.
    #[clap(long)]
    pub pointer: String,

    /// Projection context (`request`, `response` or `other`).
    #[clap(long, default_value = "other")]
    pub context: SchemaContext,
}

/// Executes the sample command, writing the value (or `null`) to `out`.
pub fn execute(args: &SampleArgs, out: &mut impl Write) -> CliResult<()> {
    let (document, options) = args.input.load()?;
    let value = synthesize_pointer(&document, &args.pointer, args.context, &options)?;
    if value.is_none() {
        warn!(pointer = %args.pointer, "no example could be produced");
    }
    write_json(out, &value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const DOC: &str = r#"
swagger: "2.0"
definitions:
  Pet:
    type: object
    required: [name, age]
    properties:
      name: { type: string, example: Rex }
      age: { type: integer }
      tag: { type: string }
  Code:
    type: string
    pattern: '^[A-F]{4}$'
"#;

    fn run(
        pointer: &str,
        seed: Option<u64>,
        no_fallback: bool,
        config: Option<std::path::PathBuf>,
    ) -> Value {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("swagger.yaml");
        fs::write(&spec, DOC).unwrap();
        let args = SampleArgs {
            input: InputArgs {
                spec,
                config,
                seed,
                no_fallback,
            },
            pointer: pointer.to_string(),
            context: SchemaContext::Other,
        };
        let mut out = Vec::new();
        execute(&args, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_sample_object() {
        assert_eq!(
            run("#/definitions/Pet", None, false, None),
            json!({ "name": "Rex", "age": "<integer>" })
        );
    }

    #[test]
    fn test_sample_pattern_is_seeded() {
        let a = run("#/definitions/Code", Some(7), false, None);
        let b = run("#/definitions/Code", Some(7), false, None);
        assert_eq!(a, b);
        let code = a.as_str().unwrap();
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| ('A'..='F').contains(&c)));
    }

    #[test]
    fn test_sample_without_fallback_is_null() {
        assert_eq!(run("#/definitions/Code", None, true, None), Value::Null);
    }

    #[test]
    fn test_config_file_disables_fallback() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("oas-synth.yaml");
        fs::write(&config, "synthesis:\n  fallbackSampling: false\n").unwrap();
        assert_eq!(run("#/definitions/Code", None, false, Some(config)), Value::Null);
    }
}
