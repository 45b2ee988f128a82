//! # balance_core - Matchup Table Balance Analysis
//!
//! Monte-Carlo sampling of offense/defense matchup tables, checked against a
//! static catalog of balance guardrails, with peer outlier detection and a
//! consolidated report.
//!
//! ## Features
//! - Seeded, reproducible sampling (same seed = same fingerprint)
//! - Time-boxed per-table analysis and cooperative run timeout
//! - Guardrail compliance scoring and severity grading
//! - Z-score, IQR, absolute-threshold and playbook-identity outlier checks
//! - JSON (schema-described) and text reports

pub mod analysis;
pub mod clock;
pub mod compliance;
pub mod error;
pub mod guardrails;
pub mod outliers;
pub mod report;
pub mod simulation;

pub use analysis::{StatisticalAnalyzer, TableAnalysis, TableInfo};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use compliance::{ComplianceResult, ComplianceStatus, GuardrailChecker};
pub use error::{BalanceError, Result};
pub use guardrails::{GuardrailRange, ViolationSeverity};
pub use outliers::{get_outlier_summary, OutlierAnalysis, OutlierDetector, OutlierSummary};
pub use report::{BalanceReport, ReportFormat, ReportGenerator};
pub use simulation::{
    create_default_config, discover_tables, run_pipeline, validate_config, PipelineOutput,
    SimulationConfig, SimulationResult, SimulationRunner,
};

/// Crate version, stamped into report metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
