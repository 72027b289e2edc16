//! Batch encoder configuration.
//!
//! Values come from an optional JSON file; command-line flags override them.
//! Every field has a default, so a partial file is valid.

use crate::genotype::DefaultPolicy;
use crate::io::read_json;
use crate::lookup::{grch37_ranges, ChromosomeRange};
use crate::pipeline::BatchError;
use crate::utils::ParallelConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Variants encoded per chromosome when no limit is configured.
pub const DEFAULT_PER_CHROMOSOME_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Worker threads for the batch.
    pub threads: usize,
    /// Variants handed to a worker at a time.
    pub chunk_size: usize,
    /// Log and skip variants that fail to encode instead of aborting.
    pub continue_on_error: bool,
    pub default_policy: DefaultPolicy,
    /// Maximum variants selected per chromosome; `None` selects all.
    pub per_chromosome_limit: Option<usize>,
    pub chromosome_ranges: Vec<ChromosomeRange>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        let parallel = ParallelConfig::default();
        EncoderConfig {
            threads: parallel.threads,
            chunk_size: parallel.chunk_size,
            continue_on_error: parallel.continue_on_error,
            default_policy: DefaultPolicy::default(),
            per_chromosome_limit: Some(DEFAULT_PER_CHROMOSOME_LIMIT),
            chromosome_ranges: grch37_ranges(),
        }
    }
}

impl EncoderConfig {
    /// Loads a configuration file (plain or gzip-compressed JSON).
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let config: EncoderConfig = read_json(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.threads == 0 {
            return Err(BatchError::Config("threads must be > 0".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(BatchError::Config("chunk_size must be > 0".to_string()));
        }
        if let Some(range) = self
            .chromosome_ranges
            .iter()
            .find(|range| range.min_start > range.max_start)
        {
            return Err(BatchError::Config(format!(
                "chromosome {} has minStart {} > maxStart {}",
                range.id, range.min_start, range.max_start
            )));
        }
        Ok(())
    }

    pub fn parallel_config(&self) -> ParallelConfig {
        ParallelConfig {
            threads: self.threads,
            chunk_size: self.chunk_size,
            continue_on_error: self.continue_on_error,
        }
    }
}
