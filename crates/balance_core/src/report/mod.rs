//! # Report
//!
//! Aggregates a run into a `BalanceReport` and renders it.
//!
//! - `model` - Serializable report sections (JSON schema via schemars)
//! - `generator` - Summary, rollups, greedy recommendations, result join
//! - `export` - JSON/text rendering and atomic file output

pub mod export;
pub mod generator;
pub mod model;

pub use export::{
    default_report_filename, export_to_json, export_to_text, render_report, write_report,
    ReportFormat,
};
pub use generator::{
    classify_health, describe_guardrail, ReportContext, ReportGenerator, ResultJoin,
};
pub use model::{
    Appendices, BalanceReport, ComplianceSection, DetailedResult, HealthStatus, OutlierSection,
    PlaybookCompliance, PlaybookOutliers, PriorityRecommendation, RecommendationSection,
    ReportMetadata, ReportSummary, TopIssue, TrendEntry,
};
