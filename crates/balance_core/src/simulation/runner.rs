//! SimulationRunner - Batch Orchestration
//!
//! Runs the analyzer over a table list in batches of `max_concurrency`,
//! records per-table failures without stopping, reports progress after each
//! batch and stops cooperatively between batches once the run timeout is hit.
//! Compliance is checked once over the surviving analyses.
//!
//! ## Determinism
//! In `SharedStream` mode one ChaCha8 stream seeded with `config.seed` is
//! consumed in table order, so the batch size never changes the output.
//! `IndependentStreams` seeds one stream per table from `(seed, index)`,
//! which keeps results identical when a batch runs on several threads.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::config::{ExecutionMode, SimulationConfig};
use crate::analysis::{StatisticalAnalyzer, TableAnalysis, TableInfo};
use crate::clock::{Clock, SystemClock};
use crate::compliance::{ComplianceResult, ComplianceStatus, GuardrailChecker};
use crate::error::Result;

/// Progress snapshot handed to the progress callback after every batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationProgress {
    pub total: usize,
    pub completed: usize,
    /// Last table of the finished batch
    pub current: Option<String>,
    /// Milliseconds, `elapsed / completed * remaining`
    pub estimated_time_remaining: Option<f64>,
    pub errors: Vec<String>,
}

impl SimulationProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

pub type ProgressCallback = Box<dyn FnMut(&SimulationProgress) + Send>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub compliant: usize,
    pub warning: usize,
    pub violation: usize,
    pub critical: usize,
    /// Mean compliance score, 0 when nothing was analyzed
    pub total_score: f64,
}

impl RunSummary {
    pub fn from_compliance(compliance: &[ComplianceResult]) -> Self {
        let mut summary = RunSummary::default();
        for result in compliance {
            match result.overall {
                ComplianceStatus::Compliant => summary.compliant += 1,
                ComplianceStatus::Warning => summary.warning += 1,
                ComplianceStatus::Violation => summary.violation += 1,
                ComplianceStatus::Critical => summary.critical += 1,
            }
        }
        if !compliance.is_empty() {
            summary.total_score =
                compliance.iter().map(|c| c.score).sum::<f64>() / compliance.len() as f64;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Successful analyses only; index-aligned with `compliance`
    pub analyses: Vec<TableAnalysis>,
    pub compliance: Vec<ComplianceResult>,
    pub errors: Vec<String>,
    /// Wall time (ms)
    pub duration: f64,
    pub config: SimulationConfig,
    pub summary: RunSummary,
}

impl SimulationResult {
    /// SHA-256 of the analyses with timing and memory diagnostics removed.
    /// Equal fingerprints mean the runs sampled identically.
    pub fn fingerprint(&self) -> String {
        let stripped: Vec<TableAnalysis> = self
            .analyses
            .iter()
            .map(TableAnalysis::without_diagnostics)
            .collect();
        let bytes = serde_json::to_vec(&stripped).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Seed for table `index` in `IndependentStreams` mode.
pub fn table_seed(seed: u64, index: usize) -> u64 {
    fxhash::hash64(&(seed, index as u64))
}

pub struct SimulationRunner {
    config: SimulationConfig,
    analyzer: StatisticalAnalyzer,
    checker: GuardrailChecker,
    clock: Arc<dyn Clock>,
    progress_callback: Option<ProgressCallback>,
}

impl SimulationRunner {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            analyzer: StatisticalAnalyzer::new(),
            checker: GuardrailChecker::new(),
            clock: Arc::new(SystemClock::new()),
            progress_callback: None,
        }
    }

    /// Clock for the run timeout and duration (the analyzer keeps its own).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_analyzer(mut self, analyzer: StatisticalAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_checker(mut self, checker: GuardrailChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Register the progress callback; it only fires when
    /// `enable_progress_tracking` is set.
    pub fn on_progress(&mut self, callback: impl FnMut(&SimulationProgress) + Send + 'static) {
        self.progress_callback = Some(Box::new(callback));
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run_analysis(&mut self, tables: &[TableInfo]) -> SimulationResult {
        let start = self.clock.now_ms();
        let batch_size = self.config.max_concurrency.max(1);
        let mut shared_rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut progress = SimulationProgress {
            total: tables.len(),
            ..SimulationProgress::default()
        };
        let mut analyses = Vec::with_capacity(tables.len());
        let mut errors = Vec::new();

        log::info!(
            "Starting balance analysis: {} tables, {} samples each, seed {}",
            tables.len(),
            self.config.sample_size,
            self.config.seed
        );

        for (batch_index, batch) in tables.chunks(batch_size).enumerate() {
            let elapsed = self.clock.now_ms() - start;
            if elapsed > self.config.timeout_ms as f64 {
                let message = format!("Analysis timeout after {}ms", elapsed.round() as u64);
                log::warn!("{}", message);
                errors.push(message.clone());
                progress.errors.push(message);
                break;
            }

            let offset = batch_index * batch_size;
            let outcomes = self.run_batch(batch, offset, &mut shared_rng);

            for (table, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(analysis) if analysis.is_sentinel() => {
                        let message = format!(
                            "Table {} drew no samples within the time budget",
                            table.id
                        );
                        log::warn!("{}", message);
                        errors.push(message.clone());
                        progress.errors.push(message);
                    }
                    Ok(analysis) => analyses.push(analysis),
                    Err(err) => {
                        let message = format!("Failed to analyze table {}: {}", table.id, err);
                        log::warn!("{}", message);
                        errors.push(message.clone());
                        progress.errors.push(message);
                    }
                }
            }

            progress.completed += batch.len();
            progress.current = batch.last().map(|t| t.id.clone());
            let elapsed = self.clock.now_ms() - start;
            let remaining = progress.total - progress.completed;
            progress.estimated_time_remaining =
                Some(elapsed / progress.completed as f64 * remaining as f64);

            log::debug!(
                "Batch {} done: {}/{} tables",
                batch_index + 1,
                progress.completed,
                progress.total
            );

            if self.config.enable_progress_tracking {
                if let Some(callback) = self.progress_callback.as_mut() {
                    callback(&progress);
                }
            }
        }

        let compliance = self.checker.check_batch_compliance(&analyses);
        let summary = RunSummary::from_compliance(&compliance);
        let duration = (self.clock.now_ms() - start).max(0.0);

        log::info!(
            "Balance analysis finished in {:.0}ms: {} analyzed, {} errors, mean score {:.1}",
            duration,
            analyses.len(),
            errors.len(),
            summary.total_score
        );

        SimulationResult {
            analyses,
            compliance,
            errors,
            duration,
            config: self.config.clone(),
            summary,
        }
    }

    fn run_batch(
        &self,
        batch: &[TableInfo],
        offset: usize,
        shared_rng: &mut ChaCha8Rng,
    ) -> Vec<Result<TableAnalysis>> {
        let analyzer = &self.analyzer;
        let sample_size = self.config.sample_size;
        match self.config.execution_mode {
            ExecutionMode::SharedStream => batch
                .iter()
                .map(|table| analyzer.analyze(table, sample_size, &mut *shared_rng))
                .collect(),
            ExecutionMode::IndependentStreams => {
                let seed = self.config.seed;
                batch
                    .par_iter()
                    .enumerate()
                    .map(|(i, table)| {
                        let mut rng = ChaCha8Rng::seed_from_u64(table_seed(seed, offset + i));
                        analyzer.analyze(table, sample_size, &mut rng)
                    })
                    .collect()
            }
        }
    }
}
