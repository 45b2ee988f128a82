//! Guardrail Checker - Compliance Scoring for One Table
//!
//! Compares every applicable guardrail against a `TableAnalysis`:
//! - Out of range -> violation, graded by distance over range width
//! - In range but close to a bound -> warning
//! - Statistical quality checks (sample size, standard error, variance shape)
//!
//! The score starts at 100 and loses a severity-weighted penalty per finding.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::sampler::PlayType;
use crate::analysis::TableAnalysis;
use crate::guardrails::{
    get_applicable_guardrails, GuardrailKind, GuardrailRange, VarianceTarget, ViolationSeverity,
    DISTRIBUTION_GUARDRAILS, STATISTICAL_THRESHOLDS,
};

/// Largest sample size the runner accepts; upper bound of the sample-size check.
const MAX_SAMPLE_SIZE: f64 = 100_000.0;

/// Overall compliance classification of a table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    Violation,
    Critical,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::Warning => "warning",
            ComplianceStatus::Violation => "violation",
            ComplianceStatus::Critical => "critical",
        }
    }
}

/// One violation or warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailFinding {
    pub guardrail: String,
    pub severity: ViolationSeverity,
    pub actual: f64,
    pub expected: GuardrailRange,
    /// Distance outside the range (violations) or to the nearest bound (warnings)
    pub deviation: f64,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub table_id: String,
    pub overall: ComplianceStatus,
    pub violations: Vec<GuardrailFinding>,
    pub warnings: Vec<GuardrailFinding>,
    /// 0-100
    pub score: f64,
    pub summary: String,
}

impl ComplianceResult {
    /// Playbook segment of the table id (text before the first `/`).
    pub fn playbook(&self) -> &str {
        playbook_segment(&self.table_id)
    }

    pub fn critical_violation_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Critical)
            .count()
    }
}

/// `"West Coast/QUICK_SLANT_vs_COVER_2"` -> `"West Coast"`; `"unknown"` when empty.
pub fn playbook_segment(table_id: &str) -> &str {
    match table_id.split('/').next() {
        Some(segment) if !segment.is_empty() && table_id.contains('/') => segment,
        _ => "unknown",
    }
}

/// Penalty weights for the compliance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceScoring {
    pub critical_penalty: f64,
    pub high_penalty: f64,
    pub medium_penalty: f64,
    pub low_penalty: f64,
    pub warning_penalty: f64,
    /// Scores below this make the table critical regardless of severities
    pub critical_score_floor: f64,
}

impl Default for ComplianceScoring {
    fn default() -> Self {
        Self {
            critical_penalty: 25.0,
            high_penalty: 15.0,
            medium_penalty: 10.0,
            low_penalty: 5.0,
            warning_penalty: 2.0,
            critical_score_floor: 40.0,
        }
    }
}

impl ComplianceScoring {
    pub fn violation_penalty(&self, severity: ViolationSeverity) -> f64 {
        match severity {
            ViolationSeverity::Critical => self.critical_penalty,
            ViolationSeverity::High => self.high_penalty,
            ViolationSeverity::Medium => self.medium_penalty,
            ViolationSeverity::Low => self.low_penalty,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuardrailChecker {
    scoring: ComplianceScoring,
}

impl GuardrailChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scoring(scoring: ComplianceScoring) -> Self {
        Self { scoring }
    }

    pub fn scoring(&self) -> &ComplianceScoring {
        &self.scoring
    }

    pub fn check_compliance(&self, analysis: &TableAnalysis) -> ComplianceResult {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        for kind in get_applicable_guardrails(&analysis.playbook) {
            let Some(actual) = kind.metric(analysis) else {
                continue;
            };
            let range = kind.range();

            if !range.contains(actual) {
                let deviation = range.distance_outside(actual);
                violations.push(GuardrailFinding {
                    guardrail: kind.name(),
                    severity: kind.severity(deviation),
                    actual,
                    expected: range,
                    deviation,
                    description: kind.description(),
                    recommendation: kind.recommendation(actual),
                });
            } else if let Some(warning) = near_boundary(&kind, actual, range) {
                warnings.push(warning);
            }
        }

        warnings.extend(statistical_warnings(analysis));

        let penalty: f64 = violations
            .iter()
            .map(|v| self.scoring.violation_penalty(v.severity))
            .sum::<f64>()
            + warnings.len() as f64 * self.scoring.warning_penalty;
        let score = (100.0 - penalty).clamp(0.0, 100.0);

        let has_critical = violations
            .iter()
            .any(|v| v.severity == ViolationSeverity::Critical);
        let overall = if has_critical || score < self.scoring.critical_score_floor {
            ComplianceStatus::Critical
        } else if !violations.is_empty() {
            ComplianceStatus::Violation
        } else if !warnings.is_empty() {
            ComplianceStatus::Warning
        } else {
            ComplianceStatus::Compliant
        };

        let summary = format!(
            "{}: {} violation(s), {} warning(s), score {:.0}",
            overall.as_str(),
            violations.len(),
            warnings.len(),
            score
        );

        ComplianceResult {
            table_id: analysis.table_id.clone(),
            overall,
            violations,
            warnings,
            score,
            summary,
        }
    }

    /// One result per analysis, same order.
    pub fn check_batch_compliance(&self, analyses: &[TableAnalysis]) -> Vec<ComplianceResult> {
        analyses.iter().map(|a| self.check_compliance(a)).collect()
    }
}

fn near_boundary(kind: &GuardrailKind, actual: f64, range: GuardrailRange) -> Option<GuardrailFinding> {
    let margin = kind.warning_margin() * range.width();
    let distance = range.distance_to_edge(actual);
    if distance >= margin {
        return None;
    }
    let side = if actual - range.min < range.max - actual {
        "lower"
    } else {
        "upper"
    };
    Some(GuardrailFinding {
        guardrail: kind.name(),
        severity: ViolationSeverity::Low,
        actual,
        expected: range,
        deviation: distance,
        description: format!("{} (near {} bound)", kind.description(), side),
        recommendation: format!(
            "Monitor {}; {:.2} from the {} bound",
            kind.name(),
            distance,
            side
        ),
    })
}

fn statistical_warnings(analysis: &TableAnalysis) -> Vec<GuardrailFinding> {
    let mut warnings = Vec::new();
    let n = analysis.sample_size;

    let min_sample = STATISTICAL_THRESHOLDS.min_sample_size as f64;
    if (n as f64) < min_sample {
        warnings.push(GuardrailFinding {
            guardrail: "sampleSize".to_string(),
            severity: ViolationSeverity::Low,
            actual: n as f64,
            expected: GuardrailRange::new(min_sample, MAX_SAMPLE_SIZE),
            deviation: min_sample - n as f64,
            description: "Samples drawn for this table".to_string(),
            recommendation: format!("Sample at least {} plays per table", min_sample),
        });
    }
    if n == 0 {
        return warnings;
    }

    // Worst-case (p = 0.5) standard error of a proportion at this sample size,
    // so the warning never depends on the scored rates
    let standard_error = 0.5 / (n as f64).sqrt();
    let max_error = STATISTICAL_THRESHOLDS.max_standard_error;
    if standard_error > max_error {
        warnings.push(GuardrailFinding {
            guardrail: "standardError".to_string(),
            severity: ViolationSeverity::Low,
            actual: standard_error,
            expected: GuardrailRange::new(0.0, max_error),
            deviation: standard_error - max_error,
            description: "Worst-case standard error of the sampled rates".to_string(),
            recommendation: "Increase the sample size to tighten the rate estimates"
                .to_string(),
        });
    }

    let target: Option<(&str, VarianceTarget)> =
        match PlayType::from_card(&analysis.offense_card) {
            PlayType::Run => Some(("run", DISTRIBUTION_GUARDRAILS.run_variance)),
            PlayType::Pass => Some(("pass", DISTRIBUTION_GUARDRAILS.pass_variance)),
            PlayType::Other => None,
        };
    if let Some((label, target)) = target {
        if !target.std_dev.contains(analysis.yards_std_dev) {
            warnings.push(GuardrailFinding {
                guardrail: "yardsStdDev".to_string(),
                severity: ViolationSeverity::Low,
                actual: analysis.yards_std_dev,
                expected: target.std_dev,
                deviation: target.std_dev.distance_outside(analysis.yards_std_dev),
                description: format!("Yards spread against the {} variance target", label),
                recommendation: format!(
                    "Widen or narrow the result rows toward a {:.0}-{:.0} yard spread",
                    target.std_dev.min, target.std_dev.max
                ),
            });
        }
        let skew = analysis.distribution.skewness.abs();
        if skew > target.max_abs_skewness {
            warnings.push(GuardrailFinding {
                guardrail: "yardsSkewness".to_string(),
                severity: ViolationSeverity::Low,
                actual: analysis.distribution.skewness,
                expected: GuardrailRange::new(-target.max_abs_skewness, target.max_abs_skewness),
                deviation: skew - target.max_abs_skewness,
                description: format!("Yards skew against the {} variance target", label),
                recommendation: "Rebalance the long tail of the result rows".to_string(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TableInfo;
    use proptest::prelude::*;

    /// West Coast pass table sitting comfortably inside every range.
    fn balanced_analysis() -> TableAnalysis {
        let table = TableInfo::new("West Coast", "QUICK_PASS", "COVER_2");
        let mut a = TableAnalysis::sentinel(&table);
        a.sample_size = 10_000;
        a.requested_sample_size = 10_000;
        a.avg_yards = 6.5;
        a.yards_std_dev = 11.0;
        a.turnover_rate = 15.0;
        a.explosive_rate = 17.0;
        a.sack_rate = 6.0;
        a.penalty_rate = 11.0;
        a.clock_distribution.thirty = 32.0;
        a.red_zone_efficiency = 78.0;
        a
    }

    #[test]
    fn test_balanced_table_is_compliant() {
        let result = GuardrailChecker::new().check_compliance(&balanced_analysis());
        assert!(result.violations.is_empty(), "{:?}", result.violations);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.overall, ComplianceStatus::Compliant);
        assert_eq!(result.playbook(), "West Coast");
    }

    #[test]
    fn test_west_coast_explosive_violation() {
        let mut analysis = balanced_analysis();
        analysis.explosive_rate = 35.0;
        let result = GuardrailChecker::new().check_compliance(&analysis);

        let global = result
            .violations
            .iter()
            .find(|v| v.guardrail == "explosivePassRate")
            .expect("explosivePassRate violation");
        assert_eq!(global.actual, 35.0);
        assert_eq!(global.deviation, 10.0);
        // 10 / 10 is not above 1.0
        assert_eq!(global.severity, ViolationSeverity::High);

        let identity = result
            .violations
            .iter()
            .find(|v| v.guardrail == "westCoast.explosiveRate")
            .expect("identity violation");
        assert_eq!(identity.severity, ViolationSeverity::Critical);
        assert_eq!(result.overall, ComplianceStatus::Critical);
        assert_eq!(result.score, 60.0);
    }

    #[test]
    fn test_run_card_still_gets_global_guardrails() {
        let table = TableInfo::new("West Coast", "INSIDE_RUN", "BASE_4_3");
        let mut analysis = balanced_analysis();
        analysis.table_id = table.id.clone();
        analysis.offense_card = table.offense_card.clone();
        analysis.explosive_rate = 35.0;

        let result = GuardrailChecker::new().check_compliance(&analysis);
        let global = result
            .violations
            .iter()
            .find(|v| v.guardrail == "explosivePassRate")
            .expect("explosivePassRate violation");
        assert_eq!(global.actual, 35.0);
        assert!(result
            .violations
            .iter()
            .any(|v| v.guardrail == "westCoast.explosiveRate"));
    }

    #[test]
    fn test_run_card_sack_rate_is_checked() {
        let table = TableInfo::new("Smashmouth", "POWER_RUN", "BASE_4_3");
        let mut analysis = balanced_analysis();
        analysis.table_id = table.id.clone();
        analysis.playbook = table.playbook.clone();
        analysis.offense_card = table.offense_card.clone();
        analysis.sack_rate = 0.0;

        let result = GuardrailChecker::new().check_compliance(&analysis);
        assert!(result.violations.iter().any(|v| v.guardrail == "sackRate"));
    }

    #[test]
    fn test_standard_error_ignores_scored_rates() {
        let mut middle = balanced_analysis();
        middle.sample_size = 200;
        middle.explosive_rate = 50.0;
        let mut extreme = middle.clone();
        extreme.explosive_rate = 95.0;

        let checker = GuardrailChecker::new();
        let middle = checker.check_compliance(&middle);
        let extreme = checker.check_compliance(&extreme);
        assert!(middle.warnings.iter().any(|w| w.guardrail == "standardError"));
        assert!(extreme.warnings.iter().any(|w| w.guardrail == "standardError"));
        assert!(extreme.score <= middle.score);
    }

    #[test]
    fn test_near_boundary_warning() {
        let mut analysis = balanced_analysis();
        // penalty 8-15, margin 0.7
        analysis.penalty_rate = 14.5;
        let result = GuardrailChecker::new().check_compliance(&analysis);

        assert!(result.violations.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].guardrail, "penaltyRate");
        assert!((result.warnings[0].deviation - 0.5).abs() < 1e-9);
        assert_eq!(result.score, 98.0);
        assert_eq!(result.overall, ComplianceStatus::Warning);
    }

    #[test]
    fn test_statistical_warnings() {
        let mut analysis = balanced_analysis();
        analysis.sample_size = 200;
        analysis.yards_std_dev = 20.0;
        let result = GuardrailChecker::new().check_compliance(&analysis);
        let names: Vec<&str> = result.warnings.iter().map(|w| w.guardrail.as_str()).collect();

        assert!(names.contains(&"sampleSize"));
        // 0.5 / sqrt(200) = 0.0354
        assert!(names.contains(&"standardError"));
        assert!(names.contains(&"yardsStdDev"));
    }

    #[test]
    fn test_empty_sample_only_warns_on_size() {
        let table = TableInfo::new("Spread", "QUICK_PASS", "COVER_2");
        let result = GuardrailChecker::new().check_compliance(&TableAnalysis::sentinel(&table));
        assert!(result.warnings.iter().any(|w| w.guardrail == "sampleSize"));
        assert!(result.warnings.iter().all(|w| w.guardrail != "standardError"));
        assert!(result.score >= 0.0);
    }

    #[test]
    fn test_score_floor_makes_critical() {
        let mut analysis = balanced_analysis();
        // Five high violations (75 points) without any critical one
        analysis.turnover_rate = 26.0;
        analysis.sack_rate = 11.0;
        analysis.penalty_rate = 20.0;
        analysis.red_zone_efficiency = 62.0;
        analysis.clock_distribution.thirty = 48.0;
        let result = GuardrailChecker::new().check_compliance(&analysis);

        assert_eq!(result.critical_violation_count(), 0);
        assert!(result.score < 40.0);
        assert_eq!(result.overall, ComplianceStatus::Critical);
    }

    #[test]
    fn test_batch_preserves_order_and_length() {
        let mut second = balanced_analysis();
        second.table_id = "Spread/JET_SWEEP_vs_COVER_1".to_string();
        let batch = vec![balanced_analysis(), second];
        let results = GuardrailChecker::new().check_batch_compliance(&batch);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].table_id, "Spread/JET_SWEEP_vs_COVER_1");
        assert!(GuardrailChecker::new().check_batch_compliance(&[]).is_empty());
    }

    #[test]
    fn test_playbook_segment() {
        assert_eq!(playbook_segment("Air Raid/FOUR_VERTS_vs_COVER_2"), "Air Raid");
        assert_eq!(playbook_segment("no-slash"), "unknown");
        assert_eq!(playbook_segment("/x"), "unknown");
    }

    proptest! {
        #[test]
        fn test_score_drops_as_explosive_rate_climbs(
            rate in 25.0f64..100.0,
            step in 0.0f64..50.0,
        ) {
            let checker = GuardrailChecker::new();
            let mut lower = balanced_analysis();
            lower.explosive_rate = rate;
            let mut higher = balanced_analysis();
            higher.explosive_rate = rate + step;

            let lower = checker.check_compliance(&lower);
            let higher = checker.check_compliance(&higher);
            prop_assert!(higher.score <= lower.score);
            prop_assert!(higher.overall >= lower.overall);
        }

        #[test]
        fn test_score_drops_as_explosive_rate_climbs_on_small_samples(
            sample_size in 150usize..300,
            rate in 25.0f64..100.0,
            step in 0.0f64..50.0,
        ) {
            let checker = GuardrailChecker::new();
            let mut lower = balanced_analysis();
            lower.sample_size = sample_size;
            lower.explosive_rate = rate;
            let mut higher = lower.clone();
            higher.explosive_rate = rate + step;

            let lower = checker.check_compliance(&lower);
            let higher = checker.check_compliance(&higher);
            prop_assert!(higher.score <= lower.score);
            prop_assert!(higher.overall >= lower.overall);
        }

        #[test]
        fn test_score_is_bounded(
            turnover in 0.0f64..100.0,
            explosive in 0.0f64..100.0,
            penalty in 0.0f64..100.0,
        ) {
            let mut analysis = balanced_analysis();
            analysis.turnover_rate = turnover;
            analysis.explosive_rate = explosive;
            analysis.penalty_rate = penalty;
            let result = GuardrailChecker::new().check_compliance(&analysis);
            prop_assert!((0.0..=100.0).contains(&result.score));
        }
    }
}
