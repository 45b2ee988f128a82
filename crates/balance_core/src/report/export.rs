//! Report rendering and file output.

use std::fmt::Write as _;
use std::fs::{rename, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use super::model::BalanceReport;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }
}

/// Pretty JSON, 2-space indent.
pub fn export_to_json(report: &BalanceReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Markdown-like text: title, metadata, summary and priority recommendations.
pub fn export_to_text(report: &BalanceReport) -> String {
    let mut out = String::new();
    let meta = &report.metadata;
    let summary = &report.summary;

    // Writing into a String cannot fail
    let _ = writeln!(out, "# Balance Analysis Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "Report ID: {}", meta.report_id);
    let _ = writeln!(out, "Generated: {}", meta.generated_at);
    let _ = writeln!(out, "Version: {}", meta.version);
    let _ = writeln!(
        out,
        "Sample size: {} | Seed: {} | Duration: {:.0}ms | Tables: {}",
        meta.sample_size, meta.seed, meta.duration, meta.total_tables
    );
    if let Some(fingerprint) = &meta.fingerprint {
        let _ = writeln!(out, "Fingerprint: {}", fingerprint);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Overall health: {}",
        summary.overall_health.as_str().to_uppercase()
    );
    let _ = writeln!(out, "Average score: {:.1}", summary.average_score);
    let _ = writeln!(
        out,
        "Compliant: {} | Warning: {} | With violations: {} | Critical: {}",
        summary.compliant_tables,
        summary.warning_tables,
        summary.tables_with_violations,
        summary.critical_tables
    );
    let _ = writeln!(
        out,
        "Outliers: {} across {} table(s)",
        summary.total_outliers, summary.tables_with_outliers
    );
    let _ = writeln!(out, "Risk: {}", summary.risk_level);

    if !report.recommendations.priority.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Priority Recommendations");
        for rec in &report.recommendations.priority {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}. [{}] {}", rec.priority, rec.category, rec.title);
            let _ = writeln!(out, "   {}", rec.description);
            let _ = writeln!(out, "   Affected tables: {}", rec.affected_tables.join(", "));
            let _ = writeln!(out, "   Estimated impact: {}", rec.estimated_impact);
        }
    }

    out
}

/// `balance-report-<timestamp>.<ext>` with `:` and `.` in the timestamp
/// replaced by `-`.
pub fn default_report_filename(format: ReportFormat, now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("balance-report-{}.{}", stamp, format.extension())
}

pub fn render_report(report: &BalanceReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => export_to_json(report),
        ReportFormat::Text => Ok(export_to_text(report)),
    }
}

/// Write the rendered report, via a temp file and rename.
pub fn write_report(path: &Path, report: &BalanceReport, format: ReportFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = render_report(report, format)?;
    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
    }
    rename(&temp_path, path)?;

    log::info!("Report written to {:?} ({} bytes)", path, content.len());
    Ok(())
}
