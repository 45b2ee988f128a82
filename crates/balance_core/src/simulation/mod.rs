//! # Simulation
//!
//! Batch orchestration of the analyzer over a table list.
//!
//! - `config` - `SimulationConfig`, validation, JSON/YAML loading
//! - `discovery` - Built-in table list
//! - `runner` - `SimulationRunner` (batches, progress, timeout, determinism)
//! - `pipeline` - Runner, outlier detector and report generator in one call

pub mod config;
pub mod discovery;
pub mod pipeline;
pub mod runner;

pub use config::{
    create_default_config, validate_config, ConfigValidation, ExecutionMode, SimulationConfig,
    MAX_CONCURRENCY, MAX_SAMPLE_SIZE, MIN_CONCURRENCY, MIN_SAMPLE_SIZE, MIN_TIMEOUT_MS,
};
pub use discovery::discover_tables;
pub use pipeline::{run_pipeline, PipelineOutput};
pub use runner::{
    table_seed, ProgressCallback, RunSummary, SimulationProgress, SimulationResult,
    SimulationRunner,
};
