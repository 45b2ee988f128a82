//! Balance Report CLI
//!
//! Runs the full balance pipeline over the built-in table list and writes
//! the report as text or JSON.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use balance_core::report::{default_report_filename, render_report, write_report, ReportFormat};
#[cfg(feature = "cli")]
use balance_core::simulation::{
    discover_tables, run_pipeline, validate_config, ProgressCallback, SimulationConfig,
    SimulationProgress,
};
use balance_core::BalanceReport;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "balance-report")]
#[command(about = "Monte-Carlo balance analysis of matchup tables", long_about = None)]
struct Cli {
    /// Plays sampled per table [default: 10000]
    #[arg(short = 's', long)]
    sample_size: Option<usize>,

    /// Base random seed [default: 12345]
    #[arg(long)]
    seed: Option<u64>,

    /// Tables analyzed per batch [default: 4]
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Report file (defaults to balance-report-<timestamp>.<ext>)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print progress and info logs
    #[arg(short = 'v', long)]
    verbose: bool,

    /// JSON or YAML run configuration; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

/// 2 on any critical table or critical outlier, 1 when more than 30% of
/// tables carry violations, 0 otherwise.
#[cfg_attr(not(feature = "cli"), allow(dead_code))]
fn exit_code(report: &BalanceReport) -> i32 {
    let summary = &report.summary;
    if summary.critical_tables > 0 || summary.critical_outlier_tables > 0 {
        2
    } else if summary.tables_with_violations as f64 > 0.3 * summary.total_tables as f64 {
        1
    } else {
        0
    }
}

#[cfg(feature = "cli")]
fn build_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(sample_size) = cli.sample_size {
        config.sample_size = sample_size;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrency = concurrency;
    }
    config.enable_progress_tracking = cli.verbose;

    Ok(config)
}

#[cfg(feature = "cli")]
fn print_progress(progress: &SimulationProgress) {
    let eta = progress
        .estimated_time_remaining
        .map(|ms| format!("{:.1}s", ms / 1000.0))
        .unwrap_or_else(|| "-".to_string());
    eprintln!(
        "   {:5.1}% / {}/{} / ETA {} / {}",
        progress.percent(),
        progress.completed,
        progress.total,
        eta,
        progress.current.as_deref().unwrap_or("-")
    );
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = build_config(&cli)?;
    let validation = validate_config(&config);
    if !validation.valid {
        for error in &validation.errors {
            eprintln!("❌ {}", error);
        }
        anyhow::bail!("invalid configuration ({} error(s))", validation.errors.len());
    }

    log::debug!("Run configuration: {:?}", config);

    let tables = discover_tables();
    println!("🏈 Analyzing {} tables...", tables.len());
    println!("   Samples: {}", config.sample_size);
    println!("   Seed:    {}", config.seed);
    println!("   Batch:   {}", config.max_concurrency);

    let progress: Option<ProgressCallback> = if cli.verbose {
        Some(Box::new(print_progress) as ProgressCallback)
    } else {
        None
    };
    let output = run_pipeline(&tables, config, progress);

    for error in &output.simulation.errors {
        eprintln!("⚠️  {}", error);
    }

    let format = ReportFormat::from(cli.format);
    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_report_filename(format, chrono::Utc::now())));
    write_report(&path, &output.report, format)?;

    if format == ReportFormat::Text && cli.verbose {
        println!("\n{}", render_report(&output.report, format)?);
    }

    let summary = &output.report.summary;
    println!("\n✅ Report written to: {}", path.display());
    println!(
        "   Health: {} (average score {:.1})",
        summary.overall_health.as_str(),
        summary.average_score
    );
    println!("   Risk:   {}", summary.risk_level);

    let code = exit_code(&output.report);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("balance-report CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
