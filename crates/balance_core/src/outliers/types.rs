//! Outlier findings and per-table aggregates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::TableAnalysis;
use crate::guardrails::ViolationSeverity;

/// How an outlier was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Peer z-score
    #[serde(rename = "zscore")]
    ZScore,
    /// Peer interquartile fences
    Iqr,
    /// Absolute thresholds and clustering deviation
    Isolation,
    /// Distance from the playbook identity target
    Mahalanobis,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::ZScore => "zscore",
            DetectionMethod::Iqr => "iqr",
            DetectionMethod::Isolation => "isolation",
            DetectionMethod::Mahalanobis => "mahalanobis",
        }
    }
}

/// Table metrics the detector compares across peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlierMetric {
    AvgYards,
    YardsStdDev,
    TurnoverRate,
    ExplosiveRate,
    SackRate,
    PenaltyRate,
    ClusterStrength,
}

impl OutlierMetric {
    pub fn name(&self) -> &'static str {
        match self {
            OutlierMetric::AvgYards => "avgYards",
            OutlierMetric::YardsStdDev => "yardsStdDev",
            OutlierMetric::TurnoverRate => "turnoverRate",
            OutlierMetric::ExplosiveRate => "explosiveRate",
            OutlierMetric::SackRate => "sackRate",
            OutlierMetric::PenaltyRate => "penaltyRate",
            OutlierMetric::ClusterStrength => "clusterStrength",
        }
    }

    pub fn value(&self, analysis: &TableAnalysis) -> f64 {
        match self {
            OutlierMetric::AvgYards => analysis.avg_yards,
            OutlierMetric::YardsStdDev => analysis.yards_std_dev,
            OutlierMetric::TurnoverRate => analysis.turnover_rate,
            OutlierMetric::ExplosiveRate => analysis.explosive_rate,
            OutlierMetric::SackRate => analysis.sack_rate,
            OutlierMetric::PenaltyRate => analysis.penalty_rate,
            OutlierMetric::ClusterStrength => analysis.clustering.cluster_strength,
        }
    }
}

/// One flagged deviation. Severity is never `critical` at this level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlierResult {
    pub table_id: String,
    pub metric: String,
    pub value: f64,
    pub expected: f64,
    /// Signed distance from `expected`
    pub deviation: f64,
    pub method: DetectionMethod,
    pub severity: ViolationSeverity,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlierAnalysis {
    /// Normalized `"playbook/offense-card-slug"`
    pub table_id: String,
    pub outlier_count: usize,
    pub severity: ViolationSeverity,
    /// Up to three metric names, largest |deviation| first
    pub primary_issues: Vec<String>,
    pub outlier_details: Vec<OutlierResult>,
    pub risk_assessment: String,
}

impl OutlierAnalysis {
    pub fn high_severity_count(&self) -> usize {
        self.outlier_details
            .iter()
            .filter(|o| o.severity >= ViolationSeverity::High)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricFrequency {
    pub metric: String,
    pub count: usize,
}

/// Cross-table rollup of outlier analyses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlierSummary {
    pub total_tables: usize,
    pub total_outliers: usize,
    pub tables_with_outliers: usize,
    pub critical_tables: usize,
    pub high_severity_tables: usize,
    /// Five most frequently flagged metrics
    pub top_metrics: Vec<MetricFrequency>,
}
