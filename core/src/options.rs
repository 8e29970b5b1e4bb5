//! # Engine Options
//!
//! Tunables for normalization and synthesis. Every field has a default so a
//! partial YAML file (or none at all) is a valid configuration.

use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Vendor extension keywords (e.g. `x-nullable-reason`) copied into the
    /// normalized schema's side map. Everything else outside the keyword
    /// allow-list is dropped.
    pub preserved_extensions: Vec<String>,
    /// Example synthesis settings.
    pub synthesis: SynthesisOptions,
}

/// Settings for the value synthesizer and its random fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthesisOptions {
    /// Seed for the fallback sampler. The same seed over the same document
    /// always yields the same values.
    pub seed: u64,
    /// When false, values the priority chain cannot resolve stay unresolved
    /// instead of being sampled.
    pub fallback_sampling: bool,
    /// Upper bound on generated array lengths when `maxItems` is absent.
    pub max_array_items: usize,
    /// Upper bound on generated string lengths when `maxLength` is absent.
    pub max_string_length: usize,
    /// Repetition cap handed to the pattern sampler for `*` and `+`.
    pub max_pattern_repeat: u32,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            fallback_sampling: true,
            max_array_items: 2,
            max_string_length: 16,
            max_pattern_repeat: 8,
        }
    }
}

impl EngineOptions {
    /// Parses options from YAML (JSON is accepted as well).
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads options from a YAML file on disk.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Returns true if the given vendor keyword should be carried through normalization.
    pub fn preserves(&self, keyword: &str) -> bool {
        self.preserved_extensions.iter().any(|k| k == keyword)
    }
}
