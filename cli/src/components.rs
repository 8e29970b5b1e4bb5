#![deny(missing_docs)]

//! # Components Command
//!
//! Normalizes every named schema of a document. A schema that fails is
//! reported in place as `{"error": "..."}` and the others are still printed.

use std::io::Write;

use oas_synth_core::{normalize_components, SchemaContext};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::args::{write_json, InputArgs};
use crate::error::{CliError, CliResult};

/// Arguments for the components command.
#[derive(clap::Args, Debug, Clone)]
pub struct ComponentsArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Projection context (`request`, `response` or `other`).
    #[clap(long, default_value = "other")]
    pub context: SchemaContext,

    /// Exit with an error if any schema failed to normalize.
    #[clap(long)]
    pub strict: bool,
}

/// Executes the components command.
pub fn execute(args: &ComponentsArgs, out: &mut impl Write) -> CliResult<()> {
    let (document, options) = args.input.load()?;
    let results = normalize_components(&document, args.context, &options);

    let mut failed = 0usize;
    let mut output = Map::new();
    for (name, result) in results {
        let value = match result {
            Ok(schema) => schema.to_value(),
            Err(err) => {
                failed += 1;
                json!({ "error": err.to_string() })
            }
        };
        output.insert(name, value);
    }
    write_json(out, &Value::Object(output))?;

    if failed > 0 {
        warn!(failed, "some schemas failed to normalize");
        if args.strict {
            return Err(CliError::General(format!(
                "{} schema(s) failed to normalize",
                failed
            )));
        }
    }
    Ok(())
}
