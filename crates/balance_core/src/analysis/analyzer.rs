//! StatisticalAnalyzer - Monte-Carlo sampling of one matchup table.
//!
//! Key features:
//! - Samples the synthetic play model up to the requested size
//! - Stops early when the per-table time budget is spent (actual count reported)
//! - Folds yards moments and tag counts into football rates
//! - Independent 100-trial red-zone sub-simulation

use std::collections::BTreeMap;
use std::mem::size_of;
use std::sync::Arc;

use super::sampler::{
    sample_yards, PlayModel, PlaySample, PlayTag, UniformSource, EXPLOSIVE_YARDS,
};
use super::stats::{mean, population_std_dev, DistributionStats};
use super::types::{ClockDistribution, ClusteringMetrics, TableAnalysis, TableInfo};
use crate::clock::{Clock, SystemClock};
use crate::error::{BalanceError, Result};
use crate::guardrails::{DISTRIBUTION_GUARDRAILS, PERFORMANCE_REQUIREMENTS, STATISTICAL_THRESHOLDS};

pub const RED_ZONE_TRIALS: usize = 100;
pub const RED_ZONE_OFFENSE: &str = "RED_ZONE_PLAY";
pub const RED_ZONE_DEFENSE: &str = "GOAL_LINE";
pub const RED_ZONE_SCORE_PROBABILITY: f64 = 0.7;

/// Wraps a uniform source and remembers the first draw outside `[0, 1]`.
struct GuardedSource<'a, S: ?Sized> {
    inner: &'a mut S,
    fault: Option<f64>,
}

impl<'a, S: UniformSource + ?Sized> GuardedSource<'a, S> {
    fn new(inner: &'a mut S) -> Self {
        Self { inner, fault: None }
    }
}

impl<S: UniformSource + ?Sized> UniformSource for GuardedSource<'_, S> {
    fn next_f64(&mut self) -> f64 {
        let value = self.inner.next_f64();
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            value
        } else {
            self.fault.get_or_insert(value);
            0.5
        }
    }
}

/// Result of `validate_analysis`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisValidation {
    pub valid: bool,
    pub issues: Vec<String>,
}

pub struct StatisticalAnalyzer {
    clock: Arc<dyn Clock>,
    time_budget_ms: f64,
}

impl Default for StatisticalAnalyzer {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }
}

impl StatisticalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer reading time from `clock`, with the standard per-table budget.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            time_budget_ms: PERFORMANCE_REQUIREMENTS.max_per_table_time_ms as f64,
        }
    }

    pub fn with_time_budget_ms(mut self, budget_ms: f64) -> Self {
        self.time_budget_ms = budget_ms.max(0.0);
        self
    }

    pub fn time_budget_ms(&self) -> f64 {
        self.time_budget_ms
    }

    pub fn analyze<S: UniformSource + ?Sized>(
        &self,
        table: &TableInfo,
        sample_size: usize,
        rng: &mut S,
    ) -> Result<TableAnalysis> {
        self.analyze_table(
            &table.id,
            &table.offense_card,
            &table.defense_card,
            &table.playbook,
            sample_size,
            rng,
        )
    }

    /// Sample one table and derive its metrics.
    ///
    /// The returned `sample_size` is the number of plays actually drawn.
    pub fn analyze_table<S: UniformSource + ?Sized>(
        &self,
        table_id: &str,
        offense_card: &str,
        defense_card: &str,
        playbook: &str,
        sample_size: usize,
        rng: &mut S,
    ) -> Result<TableAnalysis> {
        if table_id.trim().is_empty() {
            return Err(BalanceError::InvalidTable("table id is empty".to_string()));
        }
        if playbook.trim().is_empty() {
            return Err(BalanceError::InvalidTable(format!(
                "{} has no playbook",
                table_id
            )));
        }

        let start = self.clock.now_ms();
        let model = PlayModel::new(offense_card, defense_card);
        let mut source = GuardedSource::new(rng);

        let mut samples: Vec<PlaySample> = Vec::with_capacity(sample_size);
        for _ in 0..sample_size {
            if self.clock.now_ms() - start >= self.time_budget_ms {
                log::debug!(
                    "{}: time budget of {}ms reached after {}/{} samples",
                    table_id,
                    self.time_budget_ms,
                    samples.len(),
                    sample_size
                );
                break;
            }
            samples.push(model.sample(&mut source));
        }

        let red_zone_efficiency = simulate_red_zone(&mut source);

        if let Some(value) = source.fault {
            return Err(BalanceError::Sampling {
                table_id: table_id.to_string(),
                reason: format!("uniform source produced {}", value),
            });
        }

        let yards: Vec<f64> = samples.iter().map(|s| s.yards as f64).collect();
        let yards_whole: Vec<i32> = samples.iter().map(|s| s.yards).collect();
        let distribution = DistributionStats::from_values(&yards);

        let n = samples.len();
        let percent = |count: usize| {
            if n == 0 {
                0.0
            } else {
                count as f64 / n as f64 * 100.0
            }
        };
        let count = |predicate: fn(&PlaySample) -> bool| {
            samples.iter().filter(|s| predicate(s)).count()
        };

        let clock_distribution = ClockDistribution {
            ten: percent(count(|s| s.clock_seconds == 10)),
            twenty: percent(count(|s| s.clock_seconds == 20)),
            thirty: percent(count(|s| s.clock_seconds == 30)),
        };

        let memory_bytes = samples.capacity() * size_of::<PlaySample>()
            + samples
                .iter()
                .map(|s| s.tags.capacity() * size_of::<PlayTag>())
                .sum::<usize>()
            + yards.capacity() * size_of::<f64>();

        let analysis = TableAnalysis {
            table_id: table_id.to_string(),
            playbook: playbook.to_string(),
            offense_card: offense_card.to_string(),
            defense_card: defense_card.to_string(),
            sample_size: n,
            requested_sample_size: sample_size,
            avg_yards: distribution.mean,
            yards_std_dev: distribution.std_dev,
            turnover_rate: percent(count(|s| s.turnover)),
            explosive_rate: percent(count(|s| s.has_tag(PlayTag::Explosive))),
            sack_rate: percent(count(|s| s.has_tag(PlayTag::Sack))),
            penalty_rate: percent(count(|s| s.penalty.is_some())),
            out_of_bounds_rate: percent(count(|s| s.out_of_bounds)),
            clock_distribution,
            clustering: clustering_metrics(&yards_whole),
            red_zone_efficiency,
            distribution,
            analysis_time: self.clock.now_ms() - start,
            memory_usage: memory_bytes as f64 / (1024.0 * 1024.0),
        };

        log::debug!(
            "{}: {} samples, avg {:.2} yds, explosive {:.1}%",
            table_id,
            analysis.sample_size,
            analysis.avg_yards,
            analysis.explosive_rate
        );

        Ok(analysis)
    }
}

/// Percentage of plays reaching each clustering threshold and how evenly
/// they spread: `1 / (1 + CV)` of those percentages.
pub fn clustering_metrics(yards: &[i32]) -> ClusteringMetrics {
    let n = yards.len();
    let mut explosive_thresholds = BTreeMap::new();
    let mut rates = Vec::with_capacity(DISTRIBUTION_GUARDRAILS.explosive_thresholds.len());

    for &threshold in DISTRIBUTION_GUARDRAILS.explosive_thresholds.iter() {
        let reached = yards.iter().filter(|&&y| y >= threshold as i32).count();
        let rate = if n == 0 {
            0.0
        } else {
            reached as f64 / n as f64 * 100.0
        };
        explosive_thresholds.insert(threshold, rate);
        rates.push(rate);
    }

    let avg = mean(&rates);
    let cluster_strength = if avg <= 0.0 {
        0.0
    } else {
        let cv = population_std_dev(&rates) / avg;
        (1.0 / (1.0 + cv)).clamp(0.0, 1.0)
    };

    ClusteringMetrics {
        explosive_thresholds,
        cluster_strength,
    }
}

/// Fixed-label red-zone sub-simulation, scored as a percentage of trials.
pub fn simulate_red_zone<S: UniformSource + ?Sized>(rng: &mut S) -> f64 {
    let params = PlayModel::new(RED_ZONE_OFFENSE, RED_ZONE_DEFENSE).params();
    let mut scores = 0usize;
    for _ in 0..RED_ZONE_TRIALS {
        let yards = sample_yards(params, rng);
        let draw = rng.next_f64();
        if yards >= EXPLOSIVE_YARDS || (draw < RED_ZONE_SCORE_PROBABILITY && yards > 0) {
            scores += 1;
        }
    }
    scores as f64 / RED_ZONE_TRIALS as f64 * 100.0
}

/// Check an analysis against the statistical and performance floors.
pub fn validate_analysis(analysis: &TableAnalysis) -> AnalysisValidation {
    let mut issues = Vec::new();

    if analysis.sample_size < STATISTICAL_THRESHOLDS.min_sample_size {
        issues.push(format!(
            "Sample size {} below minimum {}",
            analysis.sample_size, STATISTICAL_THRESHOLDS.min_sample_size
        ));
    }
    if analysis.analysis_time > PERFORMANCE_REQUIREMENTS.max_per_table_time_ms as f64 {
        issues.push(format!(
            "Analysis time {:.0}ms exceeds {}ms",
            analysis.analysis_time, PERFORMANCE_REQUIREMENTS.max_per_table_time_ms
        ));
    }
    if analysis.memory_usage > PERFORMANCE_REQUIREMENTS.max_memory_usage_mb {
        issues.push(format!(
            "Memory usage {:.1}MB exceeds {}MB",
            analysis.memory_usage, PERFORMANCE_REQUIREMENTS.max_memory_usage_mb
        ));
    }

    AnalysisValidation {
        valid: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sampler::{ConstantSource, ScriptedSource};
    use crate::clock::SteppingClock;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn analyzer() -> StatisticalAnalyzer {
        // Generous budget so debug builds never hit it
        StatisticalAnalyzer::new().with_time_budget_ms(600_000.0)
    }

    #[test]
    fn test_analysis_reports_requested_sample_when_unbounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let table = TableInfo::new("Air Raid", "FOUR_VERTS", "COVER_2");
        let analysis = analyzer().analyze(&table, 2000, &mut rng).unwrap();

        assert_eq!(analysis.sample_size, 2000);
        assert_eq!(analysis.requested_sample_size, 2000);
        assert_eq!(analysis.table_id, table.id);
        assert!(analysis.avg_yards > 3.0 && analysis.avg_yards < 12.0);
        assert!(analysis.yards_std_dev > 5.0);
        assert!((analysis.clock_distribution.total() - 100.0).abs() < 1e-6);
        for rate in [
            analysis.turnover_rate,
            analysis.explosive_rate,
            analysis.sack_rate,
            analysis.penalty_rate,
            analysis.red_zone_efficiency,
        ] {
            assert!((0.0..=100.0).contains(&rate));
        }
        assert!((0.0..=1.0).contains(&analysis.clustering.cluster_strength));
        assert_eq!(analysis.clustering.explosive_thresholds.len(), 10);
    }

    #[test]
    fn test_rates_track_model_probabilities() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let table = TableInfo::new("Spread", "QUICK_PASS", "BASE_NICKEL");
        let analysis = analyzer().analyze(&table, 20_000, &mut rng).unwrap();

        assert!((analysis.turnover_rate - 12.0).abs() < 1.5);
        assert!((analysis.penalty_rate - 12.5).abs() < 1.5);
        // Pass cards use the {0.45, 0.35, 0.20} clock weights
        assert!((analysis.clock_distribution.thirty - 20.0).abs() < 2.0);
    }

    #[test]
    fn test_same_seed_same_analysis() {
        let table = TableInfo::new("Smashmouth", "POWER_RUN", "GOAL_LINE_BLITZ");
        let a = analyzer()
            .analyze(&table, 1500, &mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();
        let b = analyzer()
            .analyze(&table, 1500, &mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a.without_diagnostics(), b.without_diagnostics());
    }

    #[test]
    fn test_slow_clock_truncates_sampling() {
        // Every clock read costs 1ms, so the 5000ms budget runs out mid-loop
        let analyzer = StatisticalAnalyzer::with_clock(Arc::new(SteppingClock::new(1.0)));
        let table = TableInfo::new("Wide Zone", "OUTSIDE_ZONE", "COVER_3");
        let analysis = analyzer
            .analyze(&table, 10_000, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();

        assert!(analysis.sample_size > 0);
        assert!(analysis.sample_size < 10_000);
        assert_eq!(analysis.requested_sample_size, 10_000);
        assert!(analysis.analysis_time >= 5000.0);
    }

    #[test]
    fn test_zero_budget_yields_empty_sample_without_error() {
        let analyzer = StatisticalAnalyzer::with_clock(Arc::new(SteppingClock::new(1.0)))
            .with_time_budget_ms(0.0);
        let table = TableInfo::new("Spread", "JET_SWEEP", "COVER_1");
        let analysis = analyzer
            .analyze(&table, 100, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        assert_eq!(analysis.sample_size, 0);
        assert_eq!(analysis.avg_yards, 0.0);
        assert_eq!(analysis.explosive_rate, 0.0);
    }

    #[test]
    fn test_constant_source_run_table() {
        let table = TableInfo::new("Smashmouth", "POWER_RUN", "BASE_4_3");
        let analysis = analyzer()
            .analyze(&table, 50, &mut ConstantSource(0.5))
            .unwrap();

        assert_eq!(analysis.avg_yards, 0.0);
        assert_eq!(analysis.yards_std_dev, 0.0);
        assert_eq!(analysis.turnover_rate, 0.0);
        assert_eq!(analysis.clock_distribution.thirty, 100.0);
        assert_eq!(analysis.clustering.cluster_strength, 0.0);
        // yards 0 never scores, draw 0.5 < 0.7 needs yards > 0
        assert_eq!(analysis.red_zone_efficiency, 0.0);
    }

    #[test]
    fn test_invalid_uniform_is_a_sampling_error() {
        let table = TableInfo::new("Spread", "QUICK_PASS", "COVER_2");
        let err = analyzer()
            .analyze(&table, 10, &mut ScriptedSource::new(vec![0.3, f64::NAN]))
            .unwrap_err();
        assert!(matches!(err, BalanceError::Sampling { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_empty_identity_is_rejected() {
        let err = analyzer()
            .analyze_table("", "QUICK_PASS", "COVER_2", "Spread", 10, &mut ConstantSource(0.5))
            .unwrap_err();
        assert!(matches!(err, BalanceError::InvalidTable(_)));
    }

    #[test]
    fn test_clustering_metrics() {
        let empty = clustering_metrics(&[]);
        assert_eq!(empty.cluster_strength, 0.0);
        assert_eq!(empty.explosive_thresholds[&20], 0.0);

        // Every play reaches every threshold: perfectly uniform spread
        let flat = clustering_metrics(&[80; 10]);
        assert_eq!(flat.cluster_strength, 1.0);
        assert_eq!(flat.explosive_thresholds[&80], 100.0);

        let tail = clustering_metrics(&[0, 5, 21, 22, 30, 45]);
        assert!(tail.cluster_strength > 0.0 && tail.cluster_strength < 1.0);
        assert!((tail.explosive_thresholds[&20] - 4.0 / 6.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_red_zone_counts_scores() {
        // Run params (RED_ZONE contains ZONE): u1 = u2 = 0.25 -> yards 4, draw 0.25 < 0.7
        assert_eq!(simulate_red_zone(&mut ConstantSource(0.25)), 100.0);
        assert_eq!(simulate_red_zone(&mut ConstantSource(0.5)), 0.0);
    }

    #[test]
    fn test_validate_analysis_flags_small_and_slow() {
        let table = TableInfo::new("Spread", "QUICK_PASS", "COVER_2");
        let mut analysis = TableAnalysis::sentinel(&table);
        analysis.sample_size = 500;
        analysis.analysis_time = 6000.0;

        let validation = validate_analysis(&analysis);
        assert!(!validation.valid);
        assert_eq!(validation.issues.len(), 2);

        analysis.sample_size = 10_000;
        analysis.analysis_time = 120.0;
        assert!(validate_analysis(&analysis).valid);
    }
}
