//! Balance report data model.
//!
//! Everything here is plain data: the report is built once per run and only
//! serialized afterwards.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::TableAnalysis;
use crate::compliance::ComplianceResult;
use crate::outliers::{OutlierAnalysis, OutlierSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub compliance: ComplianceSection,
    pub outliers: OutlierSection,
    pub recommendations: RecommendationSection,
    pub detailed_results: Vec<DetailedResult>,
    pub appendices: Appendices,
}

impl BalanceReport {
    /// Generate JSON schema for this report structure
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(BalanceReport)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// UUID v4
    pub report_id: String,
    /// RFC 3339
    pub generated_at: String,
    pub version: String,
    pub sample_size: usize,
    pub seed: u64,
    /// Run wall time (ms)
    pub duration: f64,
    pub total_tables: usize,
    /// `SimulationResult::fingerprint` of the run, when known
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Fair => "fair",
            HealthStatus::Poor => "poor",
            HealthStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub overall_health: HealthStatus,
    /// Mean compliance score; 0.0 when no table was checked
    pub average_score: f64,
    pub total_tables: usize,
    pub compliant_tables: usize,
    pub warning_tables: usize,
    /// Tables with at least one violation, critical ones included
    pub tables_with_violations: usize,
    pub critical_tables: usize,
    pub total_violations: usize,
    pub total_warnings: usize,
    pub total_outliers: usize,
    pub tables_with_outliers: usize,
    pub critical_outlier_tables: usize,
    pub risk_level: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookCompliance {
    pub total_tables: usize,
    pub average_score: f64,
    pub compliant: usize,
    pub warning: usize,
    pub violation: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopIssue {
    pub guardrail: String,
    pub count: usize,
    pub description: String,
}

/// Placeholder trend line; there is no history store to compute real trends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendEntry {
    pub metric: String,
    pub direction: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSection {
    pub by_playbook: BTreeMap<String, PlaybookCompliance>,
    pub top_issues: Vec<TopIssue>,
    pub trends: Vec<TrendEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookOutliers {
    pub total_tables: usize,
    pub tables_with_outliers: usize,
    pub total_outliers: usize,
    pub critical: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlierSection {
    pub by_playbook: BTreeMap<String, PlaybookOutliers>,
    pub summary: OutlierSummary,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRecommendation {
    /// 1 = most urgent
    pub priority: u32,
    pub category: String,
    pub title: String,
    pub description: String,
    pub affected_tables: Vec<String>,
    pub estimated_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSection {
    pub priority: Vec<PriorityRecommendation>,
    pub quick_wins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedResult {
    pub table_id: String,
    pub playbook: String,
    pub analysis: TableAnalysis,
    pub compliance: ComplianceResult,
    pub outliers: OutlierAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appendices {
    pub guardrail_glossary: BTreeMap<String, String>,
    pub methodology: String,
    pub statistical_notes: Vec<String>,
}
