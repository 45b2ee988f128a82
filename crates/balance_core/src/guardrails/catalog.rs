//! Guardrail Catalog - Balance Targets for Matchup Tables
//!
//! Static reference ranges the balance pipeline checks against:
//! - Global NFL-analytics ranges (one per tracked metric)
//! - Playbook identity ranges (what makes Air Raid feel like Air Raid)
//! - Distribution-shape targets (explosive clustering, run/pass variance)
//! - Statistical and performance thresholds

use std::collections::HashMap;

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed `[min, max]` interval a metric is expected to fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuardrailRange {
    pub min: f64,
    pub max: f64,
}

impl GuardrailRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Distance from the nearest bound, 0.0 when inside the range.
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }

    /// Distance to the nearest bound for a value inside the range.
    pub fn distance_to_edge(&self, value: f64) -> f64 {
        (value - self.min).min(self.max - value).max(0.0)
    }
}

/// A named global balance guardrail.
#[derive(Debug, Clone, Copy)]
pub struct BalanceGuardrail {
    pub name: &'static str,
    pub range: GuardrailRange,
    pub unit: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

pub static BALANCE_GUARDRAILS: [BalanceGuardrail; 9] = [
    BalanceGuardrail {
        name: "explosivePassRate",
        range: GuardrailRange::new(15.0, 25.0),
        unit: "%",
        description: "Share of plays gaining 20+ yards",
        source: "NFL Next Gen Stats 2019-2023 league averages",
    },
    BalanceGuardrail {
        name: "sackRate",
        range: GuardrailRange::new(4.0, 8.0),
        unit: "%",
        description: "Sacks per dropback",
        source: "Pro Football Reference team passing tables",
    },
    BalanceGuardrail {
        name: "deepAttemptRate",
        range: GuardrailRange::new(8.0, 15.0),
        unit: "%",
        description: "Pass attempts traveling 20+ air yards",
        source: "NFL Next Gen Stats passing aggressiveness",
    },
    BalanceGuardrail {
        name: "turnoverRate",
        range: GuardrailRange::new(10.0, 20.0),
        unit: "%",
        description: "Drives ending in an interception or lost fumble",
        source: "Football Outsiders drive stats",
    },
    BalanceGuardrail {
        name: "smashmouthRunRate",
        range: GuardrailRange::new(40.0, 60.0),
        unit: "%",
        description: "Run share for power-run offenses",
        source: "Sharp Football Analysis run/pass splits",
    },
    BalanceGuardrail {
        name: "airRaidPassRate",
        range: GuardrailRange::new(60.0, 80.0),
        unit: "%",
        description: "Pass share for Air Raid offenses",
        source: "Sharp Football Analysis run/pass splits",
    },
    BalanceGuardrail {
        name: "clockRunoffBalance",
        range: GuardrailRange::new(25.0, 40.0),
        unit: "%",
        description: "Plays consuming the maximum 30-second clock bucket",
        source: "Tabletop pacing target (one quarter per ~15 plays)",
    },
    BalanceGuardrail {
        name: "redZoneEfficiency",
        range: GuardrailRange::new(70.0, 85.0),
        unit: "%",
        description: "Red-zone trips producing points",
        source: "Pro Football Reference red zone scoring",
    },
    BalanceGuardrail {
        name: "penaltyRate",
        range: GuardrailRange::new(8.0, 15.0),
        unit: "%",
        description: "Plays with an accepted penalty",
        source: "NFL Penalty Tracker",
    },
];

/// Look up a global guardrail by name.
pub fn balance_guardrail(name: &str) -> Option<&'static BalanceGuardrail> {
    BALANCE_GUARDRAILS.iter().find(|g| g.name == name)
}

/// Expected ranges that define a playbook's offensive identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybookIdentity {
    /// Display name, e.g. "Air Raid"
    pub playbook: &'static str,
    /// Guardrail name prefix, e.g. "airRaid"
    pub key: &'static str,
    pub pass_rate: GuardrailRange,
    pub avg_gain: GuardrailRange,
    pub explosive_rate: GuardrailRange,
}

pub static PLAYBOOK_IDENTITY_GUARDRAILS: [PlaybookIdentity; 5] = [
    PlaybookIdentity {
        playbook: "West Coast",
        key: "westCoast",
        pass_rate: GuardrailRange::new(55.0, 65.0),
        avg_gain: GuardrailRange::new(5.5, 7.5),
        explosive_rate: GuardrailRange::new(12.0, 18.0),
    },
    PlaybookIdentity {
        playbook: "Spread",
        key: "spread",
        pass_rate: GuardrailRange::new(55.0, 70.0),
        avg_gain: GuardrailRange::new(6.0, 8.0),
        explosive_rate: GuardrailRange::new(15.0, 22.0),
    },
    PlaybookIdentity {
        playbook: "Air Raid",
        key: "airRaid",
        pass_rate: GuardrailRange::new(65.0, 80.0),
        avg_gain: GuardrailRange::new(6.5, 9.0),
        explosive_rate: GuardrailRange::new(18.0, 25.0),
    },
    PlaybookIdentity {
        playbook: "Smashmouth",
        key: "smashmouth",
        pass_rate: GuardrailRange::new(35.0, 45.0),
        avg_gain: GuardrailRange::new(4.0, 5.5),
        explosive_rate: GuardrailRange::new(8.0, 14.0),
    },
    PlaybookIdentity {
        playbook: "Wide Zone",
        key: "wideZone",
        pass_rate: GuardrailRange::new(40.0, 50.0),
        avg_gain: GuardrailRange::new(4.5, 6.5),
        explosive_rate: GuardrailRange::new(10.0, 16.0),
    },
];

/// Normalize a playbook label for lookups: lowercase ASCII alphanumerics only.
///
/// "West Coast", "west-coast" and "WEST_COAST" all map to "westcoast".
pub fn normalize_playbook_key(playbook: &str) -> String {
    playbook
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

static IDENTITY_BY_KEY: Lazy<HashMap<String, &'static PlaybookIdentity>> = Lazy::new(|| {
    PLAYBOOK_IDENTITY_GUARDRAILS
        .iter()
        .map(|identity| (normalize_playbook_key(identity.playbook), identity))
        .collect()
});

/// Resolve the identity ranges for a playbook label, if it is a known playbook.
pub fn playbook_identity(playbook: &str) -> Option<&'static PlaybookIdentity> {
    IDENTITY_BY_KEY.get(&normalize_playbook_key(playbook)).copied()
}

/// Yards standard-deviation band expected for a play family.
#[derive(Debug, Clone, Copy)]
pub struct VarianceTarget {
    pub std_dev: GuardrailRange,
    pub max_abs_skewness: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DistributionGuardrails {
    /// Yardage thresholds used for explosive-play clustering
    pub explosive_thresholds: [u32; 10],
    /// Allowed relative drift of clustering strength
    pub clustering_tolerance: f64,
    pub run_variance: VarianceTarget,
    pub pass_variance: VarianceTarget,
}

pub const DISTRIBUTION_GUARDRAILS: DistributionGuardrails = DistributionGuardrails {
    explosive_thresholds: [20, 25, 30, 35, 40, 45, 50, 60, 70, 80],
    clustering_tolerance: 0.15,
    run_variance: VarianceTarget {
        std_dev: GuardrailRange::new(3.0, 6.0),
        max_abs_skewness: 1.5,
    },
    pass_variance: VarianceTarget {
        std_dev: GuardrailRange::new(9.0, 14.0),
        max_abs_skewness: 2.0,
    },
};

#[derive(Debug, Clone, Copy)]
pub struct StatisticalThresholds {
    pub min_sample_size: usize,
    pub confidence_level: f64,
    pub max_standard_error: f64,
    pub min_effect_size: f64,
}

pub const STATISTICAL_THRESHOLDS: StatisticalThresholds = StatisticalThresholds {
    min_sample_size: 1000,
    confidence_level: 0.95,
    max_standard_error: 0.02,
    min_effect_size: 0.05,
};

#[derive(Debug, Clone, Copy)]
pub struct PerformanceRequirements {
    /// Whole-run budget (ms)
    pub max_analysis_time_ms: u64,
    /// Per-table sampling budget (ms)
    pub max_per_table_time_ms: u64,
    pub max_memory_usage_mb: f64,
}

pub const PERFORMANCE_REQUIREMENTS: PerformanceRequirements = PerformanceRequirements {
    max_analysis_time_ms: 30_000,
    max_per_table_time_ms: 5_000,
    max_memory_usage_mb: 100.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_nine_global_guardrails() {
        assert_eq!(BALANCE_GUARDRAILS.len(), 9);
        let explosive = balance_guardrail("explosivePassRate").unwrap();
        assert_eq!(explosive.range, GuardrailRange::new(15.0, 25.0));
        assert_eq!(balance_guardrail("penaltyRate").unwrap().range.max, 15.0);
        assert!(balance_guardrail("unknown").is_none());
    }

    #[test]
    fn test_every_range_is_well_formed() {
        for g in BALANCE_GUARDRAILS.iter() {
            assert!(g.range.min < g.range.max, "{} has an empty range", g.name);
        }
        for identity in PLAYBOOK_IDENTITY_GUARDRAILS.iter() {
            assert!(identity.pass_rate.width() > 0.0);
            assert!(identity.avg_gain.width() > 0.0);
            assert!(identity.explosive_rate.width() > 0.0);
        }
    }

    #[test]
    fn test_identity_lookup_is_case_insensitive() {
        assert_eq!(playbook_identity("Air Raid").unwrap().key, "airRaid");
        assert_eq!(playbook_identity("air-raid").unwrap().key, "airRaid");
        assert_eq!(playbook_identity("WEST_COAST").unwrap().key, "westCoast");
        assert!(playbook_identity("Run and Shoot").is_none());
    }

    #[test]
    fn test_range_distances() {
        let range = GuardrailRange::new(10.0, 20.0);
        assert_eq!(range.distance_outside(5.0), 5.0);
        assert_eq!(range.distance_outside(26.0), 6.0);
        assert_eq!(range.distance_outside(15.0), 0.0);
        assert_eq!(range.distance_to_edge(11.0), 1.0);
        assert_eq!(range.distance_to_edge(18.5), 1.5);
        assert_eq!(range.midpoint(), 15.0);
    }

    #[test]
    fn test_thresholds_match_reference_values() {
        assert_eq!(STATISTICAL_THRESHOLDS.min_sample_size, 1000);
        assert_eq!(PERFORMANCE_REQUIREMENTS.max_per_table_time_ms, 5_000);
        assert_eq!(PERFORMANCE_REQUIREMENTS.max_analysis_time_ms, 30_000);
        assert_eq!(
            DISTRIBUTION_GUARDRAILS.explosive_thresholds,
            [20, 25, 30, 35, 40, 45, 50, 60, 70, 80]
        );
    }
}
