//! Run configuration: defaults, file loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BalanceError, Result};

pub const MIN_SAMPLE_SIZE: usize = 100;
pub const MAX_SAMPLE_SIZE: usize = 100_000;
pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 16;
pub const MIN_TIMEOUT_MS: u64 = 5_000;

/// How tables draw their random numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMode {
    /// One seeded stream consumed in table order; batches run sequentially
    #[default]
    SharedStream,
    /// Each table gets its own stream seeded from `(seed, table index)`;
    /// tables inside a batch run on the rayon pool
    IndependentStreams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub sample_size: usize,
    pub seed: u64,
    pub max_concurrency: usize,
    pub enable_progress_tracking: bool,
    pub timeout_ms: u64,
    pub execution_mode: ExecutionMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        create_default_config()
    }
}

pub fn create_default_config() -> SimulationConfig {
    SimulationConfig {
        sample_size: 10_000,
        seed: 12345,
        max_concurrency: 4,
        enable_progress_tracking: true,
        timeout_ms: 30_000,
        execution_mode: ExecutionMode::SharedStream,
    }
}

/// Outcome of `validate_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_config(config: &SimulationConfig) -> ConfigValidation {
    let mut errors = Vec::new();

    if !(MIN_SAMPLE_SIZE..=MAX_SAMPLE_SIZE).contains(&config.sample_size) {
        errors.push(format!(
            "sampleSize must be between {} and {} (got {})",
            MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE, config.sample_size
        ));
    }
    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.max_concurrency) {
        errors.push(format!(
            "maxConcurrency must be between {} and {} (got {})",
            MIN_CONCURRENCY, MAX_CONCURRENCY, config.max_concurrency
        ));
    }
    if config.timeout_ms < MIN_TIMEOUT_MS {
        errors.push(format!(
            "timeoutMs must be at least {} (got {})",
            MIN_TIMEOUT_MS, config.timeout_ms
        ));
    }

    ConfigValidation {
        valid: errors.is_empty(),
        errors,
    }
}

impl SimulationConfig {
    /// Load a config file; `.json`, `.yaml` and `.yml` are recognized.
    /// Omitted fields keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let text = match extension.as_deref() {
            Some("json") | Some("yaml") | Some("yml") => std::fs::read_to_string(path)?,
            _ => {
                return Err(BalanceError::UnsupportedConfigFormat {
                    path: path.display().to_string(),
                })
            }
        };

        let config = if extension.as_deref() == Some("json") {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };

        log::info!("Loaded simulation config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> ConfigValidation {
        validate_config(self)
    }

    /// `self` if valid, otherwise `BalanceError::InvalidConfig` with every problem.
    pub fn into_validated(self) -> Result<Self> {
        let validation = self.validate();
        if validation.valid {
            Ok(self)
        } else {
            Err(BalanceError::InvalidConfig(validation.errors))
        }
    }
}
