#![deny(missing_docs)]

//! # Shared Arguments
//!
//! Document and configuration options every subcommand accepts.

use std::io::Write;
use std::path::PathBuf;

use oas_synth_core::{load_document_file, EngineOptions};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CliResult;

/// Input document and engine configuration.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the bundled OpenAPI / Swagger document (YAML or JSON).
    #[clap(long)]
    pub spec: PathBuf,

    /// Engine configuration file (YAML).
    #[clap(long, env = "OAS_SYNTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed for fallback value sampling; overrides the configuration.
    #[clap(long, env = "OAS_SYNTH_SEED")]
    pub seed: Option<u64>,

    /// Disable random fallback sampling.
    #[clap(long)]
    pub no_fallback: bool,
}

impl InputArgs {
    /// Loads the document and the effective options.
    pub fn load(&self) -> CliResult<(Value, EngineOptions)> {
        let mut options = match &self.config {
            Some(path) => EngineOptions::from_yaml_file(path)?,
            None => EngineOptions::default(),
        };
        if let Some(seed) = self.seed {
            options.synthesis.seed = seed;
        }
        if self.no_fallback {
            options.synthesis.fallback_sampling = false;
        }
        debug!(spec = ?self.spec, ?options, "loading document");
        let document = load_document_file(&self.spec)?;
        Ok((document, options))
    }
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
