//! Outlier Detector - Cross-Table Comparison Within Playbooks
//!
//! Every table is compared against its peers (the *other* tables sharing its
//! playbook) with up to four methods:
//!
//! | Method | Peers needed | Metrics |
//! |--------|--------------|---------|
//! | z-score | 3 | avgYards, yardsStdDev, turnoverRate, explosiveRate, sackRate, penaltyRate |
//! | IQR fences (2.0 x IQR) | 3 | avgYards, turnoverRate, explosiveRate |
//! | clustering deviation | 5 | clusterStrength |
//! | playbook identity | 0 | avgYards, explosiveRate, turnoverRate |
//!
//! Below three peers only absolute thresholds and the identity check run.

use std::collections::HashMap;

use super::targets::{playbook_targets, IdentityTarget};
use super::types::{
    DetectionMethod, MetricFrequency, OutlierAnalysis, OutlierMetric, OutlierResult,
    OutlierSummary,
};
use crate::analysis::stats::{mean, population_std_dev, Quartiles};
use crate::analysis::TableAnalysis;
use crate::guardrails::ViolationSeverity;

const ZSCORE_METRICS: [OutlierMetric; 6] = [
    OutlierMetric::AvgYards,
    OutlierMetric::YardsStdDev,
    OutlierMetric::TurnoverRate,
    OutlierMetric::ExplosiveRate,
    OutlierMetric::SackRate,
    OutlierMetric::PenaltyRate,
];

const IQR_METRICS: [OutlierMetric; 3] = [
    OutlierMetric::AvgYards,
    OutlierMetric::TurnoverRate,
    OutlierMetric::ExplosiveRate,
];

/// Hard ceilings used when a playbook has too few tables to compare.
pub const ABSOLUTE_THRESHOLDS: [(OutlierMetric, f64); 4] = [
    (OutlierMetric::AvgYards, 50.0),
    (OutlierMetric::ExplosiveRate, 60.0),
    (OutlierMetric::TurnoverRate, 40.0),
    (OutlierMetric::PenaltyRate, 40.0),
];

const PRIMARY_ISSUE_COUNT: usize = 3;
const TOP_METRIC_COUNT: usize = 5;

// ============================================================================
// Severity aggregation
// ============================================================================

/// Outlier tallies for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityCounts {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
}

impl SeverityCounts {
    pub fn from_results(results: &[OutlierResult]) -> Self {
        Self {
            total: results.len(),
            high: results
                .iter()
                .filter(|r| r.severity >= ViolationSeverity::High)
                .count(),
            medium: results
                .iter()
                .filter(|r| r.severity == ViolationSeverity::Medium)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityCondition {
    HighAtLeast(usize),
    MediumAtLeast(usize),
    CountAtLeast(usize),
}

impl SeverityCondition {
    fn holds(&self, counts: &SeverityCounts) -> bool {
        match *self {
            SeverityCondition::HighAtLeast(n) => counts.high >= n,
            SeverityCondition::MediumAtLeast(n) => counts.medium >= n,
            SeverityCondition::CountAtLeast(n) => counts.total >= n,
        }
    }
}

/// Ordered, first match wins. Some rows are shadowed by earlier ones and
/// never fire.
pub const SEVERITY_RULES: [(SeverityCondition, ViolationSeverity); 8] = [
    (SeverityCondition::HighAtLeast(3), ViolationSeverity::Critical),
    (SeverityCondition::CountAtLeast(6), ViolationSeverity::Critical),
    (SeverityCondition::HighAtLeast(2), ViolationSeverity::High),
    (SeverityCondition::CountAtLeast(4), ViolationSeverity::High),
    (SeverityCondition::HighAtLeast(1), ViolationSeverity::High),
    (SeverityCondition::CountAtLeast(3), ViolationSeverity::High),
    (SeverityCondition::MediumAtLeast(2), ViolationSeverity::Medium),
    (SeverityCondition::CountAtLeast(2), ViolationSeverity::Medium),
];

pub fn aggregate_severity(counts: &SeverityCounts) -> ViolationSeverity {
    SEVERITY_RULES
        .iter()
        .find(|(condition, _)| condition.holds(counts))
        .map(|(_, severity)| *severity)
        .unwrap_or(ViolationSeverity::Low)
}

// ============================================================================
// Table ids
// ============================================================================

/// `"West Coast/QUICK_SLANT_vs_COVER_2"` -> `"West Coast/quick-slant"`.
pub fn normalize_table_id(table_id: &str) -> String {
    match table_id.split_once('/') {
        Some((playbook, card)) => format!("{}/{}", playbook, offense_slug(card)),
        None => offense_slug(table_id),
    }
}

fn offense_slug(segment: &str) -> String {
    let slug: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    match slug.find("-vs-") {
        Some(index) => slug[..index].to_string(),
        None => slug,
    }
}

// ============================================================================
// Detector
// ============================================================================

/// Detector thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierDetectorConfig {
    /// Peers needed for the z-score and IQR methods
    pub min_peers: usize,
    /// Peers needed for the clustering method
    pub min_clustering_peers: usize,
    pub zscore_threshold: f64,
    pub zscore_high: f64,
    pub zscore_medium: f64,
    pub iqr_multiplier: f64,
    /// Beyond-fence distance, as a fraction of the IQR, that makes an IQR outlier high
    pub iqr_high_ratio: f64,
    pub clustering_threshold: f64,
    pub clustering_high: f64,
}

impl Default for OutlierDetectorConfig {
    fn default() -> Self {
        Self {
            min_peers: 3,
            min_clustering_peers: 5,
            zscore_threshold: 3.8,
            zscore_high: 3.5,
            zscore_medium: 2.5,
            iqr_multiplier: 2.0,
            iqr_high_ratio: 0.75,
            clustering_threshold: 0.35,
            clustering_high: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OutlierDetector {
    config: OutlierDetectorConfig,
}

impl OutlierDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutlierDetectorConfig) -> Self {
        Self { config }
    }

    /// One `OutlierAnalysis` per input table, in input order.
    pub fn detect_outliers(&self, analyses: &[TableAnalysis]) -> Vec<OutlierAnalysis> {
        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, analysis) in analyses.iter().enumerate() {
            groups.entry(analysis.playbook.as_str()).or_default().push(index);
        }

        let results: Vec<OutlierAnalysis> = analyses
            .iter()
            .enumerate()
            .map(|(index, analysis)| {
                let peers: Vec<&TableAnalysis> = groups
                    .get(analysis.playbook.as_str())
                    .map(|members| {
                        members
                            .iter()
                            .filter(|&&i| i != index)
                            .map(|&i| &analyses[i])
                            .collect()
                    })
                    .unwrap_or_default();
                self.analyze_table(analysis, &peers)
            })
            .collect();

        log::info!(
            "Outlier detection: {} outliers across {} tables",
            results.iter().map(|r| r.outlier_count).sum::<usize>(),
            results.len()
        );
        results
    }

    fn analyze_table(&self, analysis: &TableAnalysis, peers: &[&TableAnalysis]) -> OutlierAnalysis {
        let mut details = Vec::new();

        if peers.len() < self.config.min_peers {
            details.extend(self.absolute_outliers(analysis));
        } else {
            details.extend(self.zscore_outliers(analysis, peers));
            details.extend(self.iqr_outliers(analysis, peers));
            if peers.len() >= self.config.min_clustering_peers {
                details.extend(self.clustering_outlier(analysis, peers));
            }
        }
        details.extend(self.identity_outliers(analysis));

        log::debug!(
            "{}: {} peers, {} outliers",
            analysis.table_id,
            peers.len(),
            details.len()
        );

        let counts = SeverityCounts::from_results(&details);
        let severity = aggregate_severity(&counts);

        OutlierAnalysis {
            table_id: normalize_table_id(&analysis.table_id),
            outlier_count: details.len(),
            severity,
            primary_issues: primary_issues(&details),
            risk_assessment: risk_assessment(severity, &counts),
            outlier_details: details,
        }
    }

    fn absolute_outliers(&self, analysis: &TableAnalysis) -> Vec<OutlierResult> {
        ABSOLUTE_THRESHOLDS
            .iter()
            .filter_map(|&(metric, ceiling)| {
                let value = metric.value(analysis);
                (value > ceiling).then(|| OutlierResult {
                    table_id: analysis.table_id.clone(),
                    metric: metric.name().to_string(),
                    value,
                    expected: ceiling,
                    deviation: value - ceiling,
                    method: DetectionMethod::Isolation,
                    severity: ViolationSeverity::High,
                    description: format!(
                        "{} of {:.2} exceeds the absolute ceiling {:.0}",
                        metric.name(),
                        value,
                        ceiling
                    ),
                    recommendation: format!("Audit the result rows driving {}", metric.name()),
                })
            })
            .collect()
    }

    fn zscore_outliers(&self, analysis: &TableAnalysis, peers: &[&TableAnalysis]) -> Vec<OutlierResult> {
        let mut results = Vec::new();
        for metric in ZSCORE_METRICS {
            let values: Vec<f64> = peers.iter().map(|p| metric.value(p)).collect();
            if values.len() < 2 {
                continue;
            }
            let peer_mean = mean(&values);
            let peer_std = population_std_dev(&values);
            if peer_std <= f64::EPSILON {
                continue;
            }
            let value = metric.value(analysis);
            let z = (value - peer_mean).abs() / peer_std;
            if z <= self.config.zscore_threshold {
                continue;
            }
            let severity = if z > self.config.zscore_high {
                ViolationSeverity::High
            } else if z > self.config.zscore_medium {
                ViolationSeverity::Medium
            } else {
                ViolationSeverity::Low
            };
            results.push(OutlierResult {
                table_id: analysis.table_id.clone(),
                metric: metric.name().to_string(),
                value,
                expected: peer_mean,
                deviation: value - peer_mean,
                method: DetectionMethod::ZScore,
                severity,
                description: format!(
                    "{} is {:.1} standard deviations from the {} peer mean {:.2}",
                    metric.name(),
                    z,
                    analysis.playbook,
                    peer_mean
                ),
                recommendation: format!(
                    "Compare {} against other {} tables",
                    metric.name(),
                    analysis.playbook
                ),
            });
        }
        results
    }

    fn iqr_outliers(&self, analysis: &TableAnalysis, peers: &[&TableAnalysis]) -> Vec<OutlierResult> {
        let mut results = Vec::new();
        for metric in IQR_METRICS {
            let values: Vec<f64> = peers.iter().map(|p| metric.value(p)).collect();
            let quartiles = Quartiles::from_values(&values);
            let iqr = quartiles.iqr();
            let (lower, upper) = quartiles.fences(self.config.iqr_multiplier);
            let value = metric.value(analysis);

            let bound = if value < lower {
                lower
            } else if value > upper {
                upper
            } else {
                continue;
            };
            let deviation = value - bound;
            let severity = if deviation.abs() > self.config.iqr_high_ratio * iqr {
                ViolationSeverity::High
            } else {
                ViolationSeverity::Medium
            };
            results.push(OutlierResult {
                table_id: analysis.table_id.clone(),
                metric: metric.name().to_string(),
                value,
                expected: bound,
                deviation,
                method: DetectionMethod::Iqr,
                severity,
                description: format!(
                    "{} of {:.2} falls outside the peer fences [{:.2}, {:.2}]",
                    metric.name(),
                    value,
                    lower,
                    upper
                ),
                recommendation: format!(
                    "Bring {} back within the {} interquartile spread",
                    metric.name(),
                    analysis.playbook
                ),
            });
        }
        results
    }

    fn clustering_outlier(&self, analysis: &TableAnalysis, peers: &[&TableAnalysis]) -> Option<OutlierResult> {
        let metric = OutlierMetric::ClusterStrength;
        let values: Vec<f64> = peers.iter().map(|p| metric.value(p)).collect();
        let peer_mean = mean(&values);
        if peer_mean <= f64::EPSILON {
            return None;
        }
        let value = metric.value(analysis);
        let relative = (value - peer_mean).abs() / peer_mean;
        if relative <= self.config.clustering_threshold {
            return None;
        }
        Some(OutlierResult {
            table_id: analysis.table_id.clone(),
            metric: metric.name().to_string(),
            value,
            expected: peer_mean,
            deviation: value - peer_mean,
            method: DetectionMethod::Isolation,
            severity: if relative > self.config.clustering_high {
                ViolationSeverity::High
            } else {
                ViolationSeverity::Medium
            },
            description: format!(
                "Explosive clustering differs {:.0}% from the peer average",
                relative * 100.0
            ),
            recommendation: "Smooth the spread of long-gain results across yardage bands"
                .to_string(),
        })
    }

    fn identity_outliers(&self, analysis: &TableAnalysis) -> Vec<OutlierResult> {
        let Some(targets) = playbook_targets(&analysis.playbook) else {
            return Vec::new();
        };
        let checks: [(OutlierMetric, IdentityTarget); 3] = [
            (OutlierMetric::AvgYards, targets.avg_yards),
            (OutlierMetric::ExplosiveRate, targets.explosive_rate),
            (OutlierMetric::TurnoverRate, targets.turnover_rate),
        ];

        checks
            .iter()
            .filter_map(|&(metric, target)| {
                let value = metric.value(analysis);
                let deviation = value - target.center;
                if deviation.abs() <= target.range {
                    return None;
                }
                Some(OutlierResult {
                    table_id: analysis.table_id.clone(),
                    metric: metric.name().to_string(),
                    value,
                    expected: target.center,
                    deviation,
                    method: DetectionMethod::Mahalanobis,
                    severity: if deviation.abs() > 2.0 * target.range {
                        ViolationSeverity::High
                    } else {
                        ViolationSeverity::Medium
                    },
                    description: format!(
                        "{} of {:.2} is off the {} identity ({:.1} +/- {:.1})",
                        metric.name(),
                        value,
                        targets.playbook,
                        target.center,
                        target.range
                    ),
                    recommendation: format!(
                        "Retune {} toward the {} identity",
                        metric.name(),
                        targets.playbook
                    ),
                })
            })
            .collect()
    }
}

/// Metric names of the largest |deviation| findings. A metric flagged by
/// two methods appears once per finding.
fn primary_issues(details: &[OutlierResult]) -> Vec<String> {
    let mut ranked: Vec<&OutlierResult> = details.iter().collect();
    ranked.sort_by(|a, b| {
        b.deviation
            .abs()
            .partial_cmp(&a.deviation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(PRIMARY_ISSUE_COUNT)
        .map(|result| result.metric.clone())
        .collect()
}

fn risk_assessment(severity: ViolationSeverity, counts: &SeverityCounts) -> String {
    match severity {
        ViolationSeverity::Critical => format!(
            "Critical risk: {} outliers ({} high severity); table needs immediate review",
            counts.total, counts.high
        ),
        ViolationSeverity::High => format!(
            "High risk: {} outliers ({} high severity); review before the next balance pass",
            counts.total, counts.high
        ),
        ViolationSeverity::Medium => format!(
            "Medium risk: {} outliers; monitor in upcoming runs",
            counts.total
        ),
        ViolationSeverity::Low if counts.total == 0 => "Low risk: no outliers detected".to_string(),
        ViolationSeverity::Low => format!("Low risk: {} minor outlier", counts.total),
    }
}

/// Cross-table rollup.
pub fn get_outlier_summary(analyses: &[OutlierAnalysis]) -> OutlierSummary {
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for result in analyses.iter().flat_map(|a| a.outlier_details.iter()) {
        *frequency.entry(result.metric.as_str()).or_default() += 1;
    }
    let mut top_metrics: Vec<MetricFrequency> = frequency
        .into_iter()
        .map(|(metric, count)| MetricFrequency {
            metric: metric.to_string(),
            count,
        })
        .collect();
    top_metrics.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.metric.cmp(&b.metric)));
    top_metrics.truncate(TOP_METRIC_COUNT);

    OutlierSummary {
        total_tables: analyses.len(),
        total_outliers: analyses.iter().map(|a| a.outlier_count).sum(),
        tables_with_outliers: analyses.iter().filter(|a| a.outlier_count > 0).count(),
        critical_tables: analyses
            .iter()
            .filter(|a| a.severity == ViolationSeverity::Critical)
            .count(),
        high_severity_tables: analyses
            .iter()
            .filter(|a| a.severity == ViolationSeverity::High)
            .count(),
        top_metrics,
    }
}
