//! Guardrail kinds and their severity rules.
//!
//! Each checked guardrail is a variant that knows its threshold, the
//! `TableAnalysis` metric it reads and how far outside the range counts as
//! critical.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::catalog::{
    balance_guardrail, playbook_identity, GuardrailRange, PlaybookIdentity,
};
use crate::analysis::TableAnalysis;

/// Severity of a guardrail finding, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViolationSeverity {
    /// Severity from how far outside a range a value falls, as a fraction of
    /// the range width.
    pub fn from_width_ratio(ratio: f64) -> Self {
        if ratio > 1.0 {
            ViolationSeverity::Critical
        } else if ratio > 0.5 {
            ViolationSeverity::High
        } else if ratio > 0.2 {
            ViolationSeverity::Medium
        } else {
            ViolationSeverity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationSeverity::Low => "low",
            ViolationSeverity::Medium => "medium",
            ViolationSeverity::High => "high",
            ViolationSeverity::Critical => "critical",
        }
    }
}

/// Metric covered by a playbook identity guardrail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMetric {
    PassRate,
    AvgGain,
    ExplosiveRate,
}

impl IdentityMetric {
    pub fn name(&self) -> &'static str {
        match self {
            IdentityMetric::PassRate => "passRate",
            IdentityMetric::AvgGain => "avgGain",
            IdentityMetric::ExplosiveRate => "explosiveRate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardrailKind {
    ExplosivePassRate,
    SackRate,
    DeepAttemptRate,
    TurnoverRate,
    SmashmouthRunRate,
    AirRaidPassRate,
    ClockRunoffBalance,
    RedZoneEfficiency,
    PenaltyRate,
    Identity {
        identity: &'static PlaybookIdentity,
        metric: IdentityMetric,
    },
}

pub const GLOBAL_GUARDRAIL_KINDS: [GuardrailKind; 9] = [
    GuardrailKind::ExplosivePassRate,
    GuardrailKind::SackRate,
    GuardrailKind::DeepAttemptRate,
    GuardrailKind::TurnoverRate,
    GuardrailKind::SmashmouthRunRate,
    GuardrailKind::AirRaidPassRate,
    GuardrailKind::ClockRunoffBalance,
    GuardrailKind::RedZoneEfficiency,
    GuardrailKind::PenaltyRate,
];

impl GuardrailKind {
    /// Guardrail name as it appears in findings and reports.
    pub fn name(&self) -> String {
        match self {
            GuardrailKind::Identity { identity, metric } => {
                format!("{}.{}", identity.key, metric.name())
            }
            _ => self.global_name().to_string(),
        }
    }

    fn global_name(&self) -> &'static str {
        match self {
            GuardrailKind::ExplosivePassRate => "explosivePassRate",
            GuardrailKind::SackRate => "sackRate",
            GuardrailKind::DeepAttemptRate => "deepAttemptRate",
            GuardrailKind::TurnoverRate => "turnoverRate",
            GuardrailKind::SmashmouthRunRate => "smashmouthRunRate",
            GuardrailKind::AirRaidPassRate => "airRaidPassRate",
            GuardrailKind::ClockRunoffBalance => "clockRunoffBalance",
            GuardrailKind::RedZoneEfficiency => "redZoneEfficiency",
            GuardrailKind::PenaltyRate => "penaltyRate",
            GuardrailKind::Identity { .. } => "identity",
        }
    }

    pub fn range(&self) -> GuardrailRange {
        match self {
            GuardrailKind::Identity { identity, metric } => match metric {
                IdentityMetric::PassRate => identity.pass_rate,
                IdentityMetric::AvgGain => identity.avg_gain,
                IdentityMetric::ExplosiveRate => identity.explosive_rate,
            },
            _ => balance_guardrail(self.global_name())
                .map(|g| g.range)
                .unwrap_or(GuardrailRange::new(0.0, 100.0)),
        }
    }

    /// The analysis metric this guardrail reads.
    ///
    /// `None` when the synthetic single-card model cannot measure it (play-mix
    /// rates need a whole playbook, not one offense card).
    pub fn metric(&self, analysis: &TableAnalysis) -> Option<f64> {
        match self {
            GuardrailKind::ExplosivePassRate => Some(analysis.explosive_rate),
            GuardrailKind::SackRate => Some(analysis.sack_rate),
            GuardrailKind::TurnoverRate => Some(analysis.turnover_rate),
            GuardrailKind::ClockRunoffBalance => Some(analysis.clock_distribution.thirty),
            GuardrailKind::RedZoneEfficiency => Some(analysis.red_zone_efficiency),
            GuardrailKind::PenaltyRate => Some(analysis.penalty_rate),
            GuardrailKind::DeepAttemptRate
            | GuardrailKind::SmashmouthRunRate
            | GuardrailKind::AirRaidPassRate => None,
            GuardrailKind::Identity { metric, .. } => match metric {
                IdentityMetric::PassRate => None,
                IdentityMetric::AvgGain => Some(analysis.avg_yards),
                IdentityMetric::ExplosiveRate => Some(analysis.explosive_rate),
            },
        }
    }

    /// Fraction of the range width, measured inward from each bound, that
    /// raises a warning.
    pub fn warning_margin(&self) -> f64 {
        match self {
            GuardrailKind::TurnoverRate => 0.15,
            GuardrailKind::RedZoneEfficiency => 0.05,
            _ => 0.10,
        }
    }

    /// Multiplier on the width ratio before grading severity.
    fn sensitivity(&self) -> f64 {
        match self {
            GuardrailKind::TurnoverRate | GuardrailKind::SackRate => 1.25,
            _ => 1.0,
        }
    }

    /// Severity for a value `deviation` units outside the range.
    pub fn severity(&self, deviation: f64) -> ViolationSeverity {
        let width = self.range().width();
        if width <= 0.0 {
            return ViolationSeverity::Critical;
        }
        ViolationSeverity::from_width_ratio(deviation / width * self.sensitivity())
    }

    pub fn description(&self) -> String {
        match self {
            GuardrailKind::Identity { identity, metric } => format!(
                "{} identity range for {}",
                identity.playbook,
                metric.name()
            ),
            _ => balance_guardrail(self.global_name())
                .map(|g| g.description.to_string())
                .unwrap_or_default(),
        }
    }

    fn lever(&self) -> &'static str {
        match self {
            GuardrailKind::ExplosivePassRate => "the number of 20+ yard results",
            GuardrailKind::SackRate => "negative-yardage pass results against pressure",
            GuardrailKind::TurnoverRate => "interception and fumble result frequency",
            GuardrailKind::ClockRunoffBalance => "results in the 30-second clock bucket",
            GuardrailKind::RedZoneEfficiency => "short-yardage success inside the 20",
            GuardrailKind::PenaltyRate => "flag frequency on the table",
            GuardrailKind::Identity {
                metric: IdentityMetric::AvgGain,
                ..
            } => "the median result row",
            GuardrailKind::Identity {
                metric: IdentityMetric::ExplosiveRate,
                ..
            } => "long-gain rows for this playbook",
            _ => "the playbook's play-call mix",
        }
    }

    pub fn recommendation(&self, actual: f64) -> String {
        let range = self.range();
        let direction = if actual > range.max { "Reduce" } else { "Increase" };
        format!(
            "{} {} to bring {} into {:.1}-{:.1}",
            direction,
            self.lever(),
            self.name(),
            range.min,
            range.max
        )
    }
}

/// Global guardrails plus the identity set of `playbook`, if it has one.
pub fn get_applicable_guardrails(playbook: &str) -> Vec<GuardrailKind> {
    let mut kinds = GLOBAL_GUARDRAIL_KINDS.to_vec();
    if let Some(identity) = playbook_identity(playbook) {
        for metric in [
            IdentityMetric::PassRate,
            IdentityMetric::AvgGain,
            IdentityMetric::ExplosiveRate,
        ] {
            kinds.push(GuardrailKind::Identity { identity, metric });
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ladder() {
        assert_eq!(ViolationSeverity::from_width_ratio(0.1), ViolationSeverity::Low);
        assert_eq!(ViolationSeverity::from_width_ratio(0.3), ViolationSeverity::Medium);
        assert_eq!(ViolationSeverity::from_width_ratio(0.7), ViolationSeverity::High);
        assert_eq!(ViolationSeverity::from_width_ratio(1.5), ViolationSeverity::Critical);
        assert!(ViolationSeverity::Critical > ViolationSeverity::High);
    }

    #[test]
    fn test_applicable_guardrails_include_identity() {
        let generic = get_applicable_guardrails("Run and Shoot");
        assert_eq!(generic.len(), 9);

        let west_coast = get_applicable_guardrails("West Coast");
        assert_eq!(west_coast.len(), 12);
        let names: Vec<String> = west_coast.iter().map(|k| k.name()).collect();
        assert!(names.contains(&"westCoast.explosiveRate".to_string()));
        assert!(names.contains(&"explosivePassRate".to_string()));
    }

    #[test]
    fn test_turnover_escalates_faster() {
        // turnover: 4.5 / 10 * 1.25 = 0.5625, clock runoff: 4.5 / 15 = 0.3
        assert_eq!(
            GuardrailKind::TurnoverRate.severity(4.5),
            ViolationSeverity::High
        );
        assert_eq!(
            GuardrailKind::ClockRunoffBalance.severity(4.5),
            ViolationSeverity::Medium
        );
    }

    #[test]
    fn test_recommendation_direction() {
        let text = GuardrailKind::PenaltyRate.recommendation(20.0);
        assert!(text.starts_with("Reduce"));
        let text = GuardrailKind::PenaltyRate.recommendation(2.0);
        assert!(text.starts_with("Increase"));
        assert!(text.contains("8.0-15.0"));
    }
}
