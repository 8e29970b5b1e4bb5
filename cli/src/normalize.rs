#![deny(missing_docs)]

//! # Normalize Command
//!
//! Prints the draft-04 projection of one schema: either the schema at a
//! pointer, or the request/response body schema of an operation.

use std::io::Write;

use oas_synth_core::{
    normalize_pointer, normalize_request_body, normalize_response_body, OperationRef,
    SchemaContext,
};
use serde_json::Value;

use crate::args::{write_json, InputArgs};
use crate::error::{CliError, CliResult};

/// Arguments for the normalize command.
#[derive(clap::Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// JSON Pointer of the schema, e.g. `#/components/schemas/Pet`.
    #[clap(long, required_unless_present = "path", conflicts_with = "path")]
    pub pointer: Option<String>,

    /// Projection context for `--pointer`.
    #[clap(long, default_value = "other")]
    pub context: SchemaContext,

    /// Path template of an operation whose body schema is normalized.
    #[clap(long, requires = "method")]
    pub path: Option<String>,

    /// HTTP method of the operation.
    #[clap(long)]
    pub method: Option<String>,

    /// Response status; without it the request body is normalized.
    #[clap(long, requires = "path")]
    pub status: Option<String>,
}

/// Executes the normalize command, writing JSON to `out`.
pub fn execute(args: &NormalizeArgs, out: &mut impl Write) -> CliResult<()> {
    let (document, options) = args.input.load()?;

    let schema = match (&args.pointer, &args.path, &args.method) {
        (Some(pointer), _, _) => Some(normalize_pointer(
            &document,
            pointer,
            args.context,
            &options,
        )?),
        (None, Some(path), Some(method)) => {
            let op = OperationRef::new(path.as_str(), method);
            match &args.status {
                Some(status) => normalize_response_body(&document, &op, status, &options)?,
                None => normalize_request_body(&document, &op, &options)?,
            }
        }
        _ => {
            return Err(CliError::General(
                "Either --pointer or --path with --method is required".to_string(),
            ))
        }
    };

    match schema {
        Some(schema) => write_json(out, &schema),
        None => write_json(out, &Value::Null),
    }
}
