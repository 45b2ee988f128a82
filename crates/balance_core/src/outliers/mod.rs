//! # Outliers
//!
//! Peer comparison of matchup tables within a playbook.
//!
//! - `detector` - `OutlierDetector`, severity decision table, summary rollup
//! - `targets` - Playbook identity `{center, range}` targets
//! - `types` - Findings and per-table aggregates

pub mod detector;
pub mod targets;
pub mod types;

pub use detector::{
    aggregate_severity, get_outlier_summary, normalize_table_id, OutlierDetector,
    OutlierDetectorConfig, SeverityCondition, SeverityCounts, ABSOLUTE_THRESHOLDS, SEVERITY_RULES,
};
pub use targets::{playbook_targets, IdentityTarget, PlaybookTargets, PLAYBOOK_TARGETS};
pub use types::{
    DetectionMethod, MetricFrequency, OutlierAnalysis, OutlierMetric, OutlierResult,
    OutlierSummary,
};
