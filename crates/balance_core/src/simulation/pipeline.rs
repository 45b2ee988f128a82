//! Full pipeline: simulate, check, detect outliers, build the report.

use super::config::SimulationConfig;
use super::runner::{ProgressCallback, SimulationResult, SimulationRunner};
use crate::analysis::TableInfo;
use crate::outliers::{OutlierAnalysis, OutlierDetector};
use crate::report::{BalanceReport, ReportContext, ReportGenerator};

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub simulation: SimulationResult,
    pub outliers: Vec<OutlierAnalysis>,
    pub report: BalanceReport,
}

/// Run every stage with default analyzer, checker, detector and generator.
///
/// `config` is used as given; validate it first.
pub fn run_pipeline(
    tables: &[TableInfo],
    config: SimulationConfig,
    progress: Option<ProgressCallback>,
) -> PipelineOutput {
    let sample_size = config.sample_size;
    let seed = config.seed;

    let mut runner = SimulationRunner::new(config);
    if let Some(callback) = progress {
        runner.on_progress(callback);
    }
    let simulation = runner.run_analysis(tables);

    let outliers = OutlierDetector::new().detect_outliers(&simulation.analyses);
    let report = ReportGenerator::new().generate_report(
        &simulation.analyses,
        &simulation.compliance,
        &outliers,
        simulation.duration,
        &ReportContext {
            sample_size,
            seed,
            fingerprint: Some(simulation.fingerprint()),
        },
    );

    PipelineOutput {
        simulation,
        outliers,
        report,
    }
}
