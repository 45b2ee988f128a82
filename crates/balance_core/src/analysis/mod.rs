//! # Analysis
//!
//! Monte-Carlo sampling of matchup tables and the statistics derived from it.
//!
//! - `sampler` - Synthetic play model and the uniform-source seam
//! - `stats` - Moments, skewness, kurtosis and index quartiles
//! - `types` - `TableInfo` and `TableAnalysis`
//! - `analyzer` - Time-boxed `StatisticalAnalyzer`

pub mod analyzer;
pub mod sampler;
pub mod stats;
pub mod types;

pub use analyzer::{
    clustering_metrics, simulate_red_zone, validate_analysis, AnalysisValidation,
    StatisticalAnalyzer, RED_ZONE_TRIALS,
};
pub use sampler::{
    ConstantSource, PenaltyArchetype, PenaltySide, PlayModel, PlaySample, PlayTag, PlayType,
    ScriptedSource, UniformSource, YardParams, PENALTY_ARCHETYPES,
};
pub use stats::{mean, population_std_dev, DistributionStats, Quartiles};
pub use types::{ClockDistribution, ClusteringMetrics, TableAnalysis, TableInfo};
