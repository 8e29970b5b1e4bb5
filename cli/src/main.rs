#![deny(missing_docs)]

//! # OAS Synth CLI
//!
//! Command line front end for the normalization and synthesis engine.
//! Results are written to stdout as JSON, diagnostics to stderr.
//!
//! Supported Commands:
//! - `normalize`: Draft-04 projection of one schema or operation body.
//! - `sample`: Example value for the schema at a pointer.
//! - `fixture`: Parameter, body and response examples per operation.
//! - `components`: Every named schema, normalized independently.

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod args;
mod components;
mod error;
mod fixture;
mod logging;
mod normalize;
mod sample;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI schema normalization and example synthesis")]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `info`, `oas_synth_core=debug`).
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize a schema (by pointer) or an operation's body schema.
    Normalize(normalize::NormalizeArgs),
    /// Synthesize an example value for a schema.
    Sample(sample::SampleArgs),
    /// Build example fixtures for operations.
    Fixture(fixture::FixtureArgs),
    /// Normalize every named schema of the document.
    Components(components::ComponentsArgs),
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &cli.command {
        Commands::Normalize(args) => normalize::execute(args, &mut out)?,
        Commands::Sample(args) => sample::execute(args, &mut out)?,
        Commands::Fixture(args) => fixture::execute(args, &mut out)?,
        Commands::Components(args) => components::execute(args, &mut out)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sample_flags() {
        let cli = Cli::try_parse_from([
            "oas-synth",
            "sample",
            "--spec",
            "openapi.yaml",
            "--pointer",
            "#/components/schemas/Pet",
            "--context",
            "request",
            "--seed",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Sample(args) => {
                assert_eq!(args.context, oas_synth_core::SchemaContext::Request);
                assert_eq!(args.input.seed, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_context() {
        let parsed = Cli::try_parse_from([
            "oas-synth",
            "components",
            "--spec",
            "openapi.yaml",
            "--context",
            "sideways",
        ]);
        assert!(parsed.is_err());
    }
}
