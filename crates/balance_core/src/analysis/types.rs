//! Table identity and per-table analysis results.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::stats::DistributionStats;

/// Identity of one offense/defense matchup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub id: String,
    pub playbook: String,
    pub offense_card: String,
    pub defense_card: String,
    /// Location of the real dice table; unused by the synthetic model
    pub file_path: String,
}

impl TableInfo {
    pub fn new(
        playbook: impl Into<String>,
        offense_card: impl Into<String>,
        defense_card: impl Into<String>,
    ) -> Self {
        let playbook = playbook.into();
        let offense_card = offense_card.into();
        let defense_card = defense_card.into();
        let dir = playbook.to_ascii_lowercase().replace(' ', "_");
        Self {
            id: format!("{}/{}_vs_{}", playbook, offense_card, defense_card),
            file_path: format!("data/tables/{}/{}_vs_{}.json", dir, offense_card, defense_card),
            playbook,
            offense_card,
            defense_card,
        }
    }
}

/// Percentage of plays per clock-runoff bucket (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClockDistribution {
    #[serde(rename = "10")]
    pub ten: f64,
    #[serde(rename = "20")]
    pub twenty: f64,
    #[serde(rename = "30")]
    pub thirty: f64,
}

impl ClockDistribution {
    pub fn total(&self) -> f64 {
        self.ten + self.twenty + self.thirty
    }
}

/// How explosive plays spread across yardage thresholds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringMetrics {
    /// Threshold (yards) -> percentage of plays reaching it
    pub explosive_thresholds: BTreeMap<u32, f64>,
    /// 0..=1, higher = more uniform spread across thresholds
    pub cluster_strength: f64,
}

/// Monte-Carlo analysis of one matchup table.
///
/// Rates are percentages (0-100) of `sample_size`, the number of samples
/// actually drawn, which can be below `requested_sample_size` when the
/// per-table time budget runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableAnalysis {
    pub table_id: String,
    pub playbook: String,
    pub offense_card: String,
    pub defense_card: String,
    pub sample_size: usize,
    pub requested_sample_size: usize,
    pub avg_yards: f64,
    pub yards_std_dev: f64,
    pub turnover_rate: f64,
    pub explosive_rate: f64,
    pub sack_rate: f64,
    pub penalty_rate: f64,
    pub out_of_bounds_rate: f64,
    pub clock_distribution: ClockDistribution,
    pub clustering: ClusteringMetrics,
    pub red_zone_efficiency: f64,
    pub distribution: DistributionStats,
    /// Wall time spent (ms)
    pub analysis_time: f64,
    /// Estimated sample buffer size (MB)
    pub memory_usage: f64,
}

impl TableAnalysis {
    /// Zero-valued placeholder for a table whose analysis failed.
    pub fn sentinel(table: &TableInfo) -> Self {
        Self {
            table_id: table.id.clone(),
            playbook: table.playbook.clone(),
            offense_card: table.offense_card.clone(),
            defense_card: table.defense_card.clone(),
            sample_size: 0,
            requested_sample_size: 0,
            avg_yards: 0.0,
            yards_std_dev: 0.0,
            turnover_rate: 0.0,
            explosive_rate: 0.0,
            sack_rate: 0.0,
            penalty_rate: 0.0,
            out_of_bounds_rate: 0.0,
            clock_distribution: ClockDistribution::default(),
            clustering: ClusteringMetrics::default(),
            red_zone_efficiency: 0.0,
            distribution: DistributionStats::default(),
            analysis_time: 0.0,
            memory_usage: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.sample_size == 0
    }

    /// Copy with the wall-clock diagnostics zeroed, for determinism checks.
    pub fn without_diagnostics(&self) -> Self {
        Self {
            analysis_time: 0.0,
            memory_usage: 0.0,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_info_ids_follow_file_naming() {
        let table = TableInfo::new("West Coast", "QUICK_SLANT", "COVER_2");
        assert_eq!(table.id, "West Coast/QUICK_SLANT_vs_COVER_2");
        assert_eq!(
            table.file_path,
            "data/tables/west_coast/QUICK_SLANT_vs_COVER_2.json"
        );
    }

    #[test]
    fn test_sentinel_is_zero_sample() {
        let table = TableInfo::new("Spread", "BUBBLE_SCREEN", "COVER_1");
        let sentinel = TableAnalysis::sentinel(&table);
        assert!(sentinel.is_sentinel());
        assert_eq!(sentinel.table_id, table.id);
    }

    #[test]
    fn test_clock_distribution_serializes_bucket_keys() {
        let clock = ClockDistribution {
            ten: 25.0,
            twenty: 35.0,
            thirty: 40.0,
        };
        let json = serde_json::to_value(clock).unwrap();
        assert_eq!(json["10"], 25.0);
        assert_eq!(json["30"], 40.0);
        assert_eq!(clock.total(), 100.0);
    }
}
