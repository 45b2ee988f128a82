//! ReportGenerator - Run Results to `BalanceReport`
//!
//! Pure aggregation over analyses, compliance results and outlier analyses:
//! health summary, per-playbook rollups, top issues, greedy priority
//! recommendations, per-table detail and static appendices.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use super::model::{
    Appendices, BalanceReport, ComplianceSection, DetailedResult, HealthStatus, OutlierSection,
    PlaybookCompliance, PlaybookOutliers, PriorityRecommendation, RecommendationSection,
    ReportMetadata, ReportSummary, TopIssue, TrendEntry,
};
use crate::analysis::TableAnalysis;
use crate::compliance::{playbook_segment, ComplianceResult, ComplianceStatus};
use crate::guardrails::{ViolationSeverity, BALANCE_GUARDRAILS};
use crate::outliers::{get_outlier_summary, normalize_table_id, OutlierAnalysis};

const TOP_ISSUE_COUNT: usize = 5;
const MULTI_VIOLATION_THRESHOLD: usize = 3;

const OUTLIER_RECOMMENDATIONS: [&str; 3] = [
    "Review high-severity outlier tables against their playbook peers before retuning global ranges",
    "Re-run flagged tables with a larger sample size to rule out sampling noise",
    "Check identity outliers for mislabeled playbooks or copied result rows",
];

const QUICK_WINS: [&str; 3] = [
    "Trim long-gain rows on tables above the explosive-play ceiling",
    "Rebalance penalty frequency on tables outside the 8-15% band",
    "Shift clock-runoff results toward the 30-second bucket on fast-paced tables",
];

const METHODOLOGY: &str = "Each matchup table is Monte-Carlo sampled with a seeded ChaCha8 \
stream using a synthetic play model (Box-Muller yards, Bernoulli turnover, penalty and \
out-of-bounds draws, weighted clock buckets). Per-table rates are checked against global \
and playbook identity guardrails, then every table is compared with the other tables of \
its playbook using z-score, IQR, identity-distance and clustering-deviation methods.";

const STATISTICAL_NOTES: [&str; 5] = [
    "Rates are percentages of the samples actually drawn, which can be fewer than requested when the per-table time budget runs out",
    "Standard deviations are population (N) moments; kurtosis is reported as excess kurtosis",
    "Quartiles are index lookups at floor(n * 0.25) and floor(n * 0.75), not interpolated",
    "Peer comparisons exclude the table itself; z-score and IQR need at least 3 peers, clustering at least 5",
    "The average score is reported as 0 when no table was analyzed",
];

const EXTRA_GLOSSARY: [(&str, &str); 7] = [
    ("passRate", "Share of play calls that are passes"),
    ("avgGain", "Average yards gained per play"),
    ("explosiveRate", "Share of plays gaining 20+ yards"),
    ("sampleSize", "Plays sampled for the table"),
    ("standardError", "Worst-case standard error of a sampled rate at this sample size"),
    ("yardsStdDev", "Spread of yards gained against the run/pass variance target"),
    ("yardsSkewness", "Skew of yards gained against the run/pass variance target"),
];

static GUARDRAIL_GLOSSARY: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    let mut glossary: BTreeMap<String, String> = BALANCE_GUARDRAILS
        .iter()
        .map(|g| {
            (
                g.name.to_string(),
                format!(
                    "{} ({:.0}-{:.0}{})",
                    g.description, g.range.min, g.range.max, g.unit
                ),
            )
        })
        .collect();
    for (name, description) in EXTRA_GLOSSARY {
        glossary.insert(name.to_string(), description.to_string());
    }
    glossary
});

/// Human description of a finding name; identity names such as
/// `"airRaid.avgGain"` resolve through their metric suffix.
pub fn describe_guardrail(name: &str) -> String {
    if let Some(description) = GUARDRAIL_GLOSSARY.get(name) {
        return description.clone();
    }
    if let Some((playbook, metric)) = name.split_once('.') {
        if let Some(description) = GUARDRAIL_GLOSSARY.get(metric) {
            return format!("{} ({} identity)", description, playbook);
        }
    }
    format!("No description recorded for {}", name)
}

/// How detailed results pair analyses with compliance and outlier entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultJoin {
    /// Match on table id (normalized id for outliers); duplicates pair in order
    #[default]
    ByTableId,
    /// Zip by index, truncating to the shortest input
    Positional,
}

/// Run parameters echoed into the report metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportContext {
    pub sample_size: usize,
    pub seed: u64,
    pub fingerprint: Option<String>,
}

pub fn classify_health(average_score: f64, critical_tables: usize, violations: usize) -> HealthStatus {
    if average_score >= 90.0 && critical_tables == 0 {
        HealthStatus::Excellent
    } else if average_score >= 80.0 && violations == 0 {
        HealthStatus::Good
    } else if average_score >= 70.0 && critical_tables < 3 {
        HealthStatus::Fair
    } else if average_score >= 60.0 {
        HealthStatus::Poor
    } else {
        HealthStatus::Critical
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    join: ResultJoin,
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_join(join: ResultJoin) -> Self {
        Self { join }
    }

    pub fn generate_report(
        &self,
        analyses: &[TableAnalysis],
        compliance: &[ComplianceResult],
        outliers: &[OutlierAnalysis],
        duration: f64,
        context: &ReportContext,
    ) -> BalanceReport {
        let detailed_results = match self.join {
            ResultJoin::ByTableId => join_by_table_id(analyses, compliance, outliers),
            ResultJoin::Positional => join_by_position(analyses, compliance, outliers),
        };

        let report = BalanceReport {
            metadata: ReportMetadata {
                report_id: Uuid::new_v4().to_string(),
                generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                version: crate::VERSION.to_string(),
                sample_size: context.sample_size,
                seed: context.seed,
                duration,
                total_tables: analyses.len(),
                fingerprint: context.fingerprint.clone(),
            },
            summary: build_summary(analyses.len(), compliance, outliers),
            compliance: build_compliance_section(compliance),
            outliers: build_outlier_section(outliers),
            recommendations: build_recommendations(compliance, outliers),
            detailed_results,
            appendices: Appendices {
                guardrail_glossary: GUARDRAIL_GLOSSARY.clone(),
                methodology: METHODOLOGY.to_string(),
                statistical_notes: STATISTICAL_NOTES.iter().map(|s| s.to_string()).collect(),
            },
        };

        log::info!(
            "Generated balance report {}: {} tables, health {}",
            report.metadata.report_id,
            report.summary.total_tables,
            report.summary.overall_health.as_str()
        );
        report
    }
}

fn build_summary(
    total_tables: usize,
    compliance: &[ComplianceResult],
    outliers: &[OutlierAnalysis],
) -> ReportSummary {
    let count = |status: ComplianceStatus| compliance.iter().filter(|c| c.overall == status).count();

    let average_score = if compliance.is_empty() {
        0.0
    } else {
        compliance.iter().map(|c| c.score).sum::<f64>() / compliance.len() as f64
    };
    let critical_tables = count(ComplianceStatus::Critical);
    let tables_with_violations = compliance.iter().filter(|c| !c.violations.is_empty()).count();
    let total_violations: usize = compliance.iter().map(|c| c.violations.len()).sum();
    let total_warnings: usize = compliance.iter().map(|c| c.warnings.len()).sum();
    let total_outliers: usize = outliers.iter().map(|o| o.outlier_count).sum();
    let tables_with_outliers = outliers.iter().filter(|o| o.outlier_count > 0).count();
    let critical_outlier_tables = outliers
        .iter()
        .filter(|o| o.severity == ViolationSeverity::Critical)
        .count();

    let risk_level = if critical_tables > 0 || critical_outlier_tables > 0 {
        format!(
            "High risk: {} critical table(s), {} table(s) with critical outliers",
            critical_tables, critical_outlier_tables
        )
    } else if tables_with_violations > 0 {
        format!(
            "Moderate risk: {} of {} table(s) violate guardrails",
            tables_with_violations,
            compliance.len()
        )
    } else if total_warnings > 0 || total_outliers > 0 {
        format!(
            "Low risk: {} warning(s), {} outlier(s)",
            total_warnings, total_outliers
        )
    } else {
        "Minimal risk: all tables within guardrails".to_string()
    };

    ReportSummary {
        overall_health: classify_health(average_score, critical_tables, total_violations),
        average_score,
        total_tables,
        compliant_tables: count(ComplianceStatus::Compliant),
        warning_tables: count(ComplianceStatus::Warning),
        tables_with_violations,
        critical_tables,
        total_violations,
        total_warnings,
        total_outliers,
        tables_with_outliers,
        critical_outlier_tables,
        risk_level,
    }
}

fn build_compliance_section(compliance: &[ComplianceResult]) -> ComplianceSection {
    let mut by_playbook: BTreeMap<String, PlaybookCompliance> = BTreeMap::new();
    let mut score_sums: HashMap<String, f64> = HashMap::new();

    for result in compliance {
        let playbook = result.playbook().to_string();
        let entry = by_playbook.entry(playbook.clone()).or_default();
        entry.total_tables += 1;
        match result.overall {
            ComplianceStatus::Compliant => entry.compliant += 1,
            ComplianceStatus::Warning => entry.warning += 1,
            ComplianceStatus::Violation => entry.violation += 1,
            ComplianceStatus::Critical => entry.critical += 1,
        }
        *score_sums.entry(playbook).or_default() += result.score;
    }
    for (playbook, entry) in by_playbook.iter_mut() {
        let sum = score_sums.get(playbook).copied().unwrap_or(0.0);
        entry.average_score = sum / entry.total_tables as f64;
    }

    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for finding in compliance
        .iter()
        .flat_map(|c| c.violations.iter().chain(c.warnings.iter()))
    {
        *frequency.entry(finding.guardrail.as_str()).or_default() += 1;
    }
    let mut top_issues: Vec<TopIssue> = frequency
        .into_iter()
        .map(|(guardrail, count)| TopIssue {
            guardrail: guardrail.to_string(),
            count,
            description: describe_guardrail(guardrail),
        })
        .collect();
    top_issues.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.guardrail.cmp(&b.guardrail)));
    top_issues.truncate(TOP_ISSUE_COUNT);

    ComplianceSection {
        by_playbook,
        top_issues,
        trends: vec![
            TrendEntry {
                metric: "averageScore".to_string(),
                direction: "stable".to_string(),
                note: "No earlier runs recorded; trend tracking starts with this report"
                    .to_string(),
            },
            TrendEntry {
                metric: "violationCount".to_string(),
                direction: "stable".to_string(),
                note: "No earlier runs recorded; trend tracking starts with this report"
                    .to_string(),
            },
        ],
    }
}

fn build_outlier_section(outliers: &[OutlierAnalysis]) -> OutlierSection {
    let mut by_playbook: BTreeMap<String, PlaybookOutliers> = BTreeMap::new();
    for analysis in outliers {
        let entry = by_playbook
            .entry(playbook_segment(&analysis.table_id).to_string())
            .or_default();
        entry.total_tables += 1;
        entry.total_outliers += analysis.outlier_count;
        if analysis.outlier_count > 0 {
            entry.tables_with_outliers += 1;
        }
        match analysis.severity {
            ViolationSeverity::Critical => entry.critical += 1,
            ViolationSeverity::High => entry.high += 1,
            _ => {}
        }
    }

    OutlierSection {
        by_playbook,
        summary: get_outlier_summary(outliers),
        recommendations: OUTLIER_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
    }
}

fn build_recommendations(
    compliance: &[ComplianceResult],
    outliers: &[OutlierAnalysis],
) -> RecommendationSection {
    let mut priority = Vec::new();

    let critical: Vec<String> = compliance
        .iter()
        .filter(|c| c.overall == ComplianceStatus::Critical)
        .map(|c| c.table_id.clone())
        .collect();
    if !critical.is_empty() {
        priority.push(PriorityRecommendation {
            priority: priority.len() as u32 + 1,
            category: "compliance".to_string(),
            title: "Resolve critical guardrail failures".to_string(),
            description: format!(
                "{} table(s) sit far outside their guardrails or scored below the critical floor",
                critical.len()
            ),
            estimated_impact: format!("High: clears {} critical table(s)", critical.len()),
            affected_tables: critical.clone(),
        });
    }

    let multi_violation: Vec<String> = compliance
        .iter()
        .filter(|c| c.violations.len() >= MULTI_VIOLATION_THRESHOLD && !critical.contains(&c.table_id))
        .map(|c| c.table_id.clone())
        .collect();
    if !multi_violation.is_empty() {
        priority.push(PriorityRecommendation {
            priority: priority.len() as u32 + 1,
            category: "compliance".to_string(),
            title: "Rework tables with stacked violations".to_string(),
            description: format!(
                "{} table(s) break {} or more guardrails at once",
                multi_violation.len(),
                MULTI_VIOLATION_THRESHOLD
            ),
            estimated_impact: format!(
                "Medium: removes at least {} violations",
                multi_violation.len() * MULTI_VIOLATION_THRESHOLD
            ),
            affected_tables: multi_violation,
        });
    }

    let critical_outliers: Vec<String> = outliers
        .iter()
        .filter(|o| o.severity == ViolationSeverity::Critical)
        .map(|o| o.table_id.clone())
        .collect();
    if !critical_outliers.is_empty() {
        priority.push(PriorityRecommendation {
            priority: priority.len() as u32 + 1,
            category: "outliers".to_string(),
            title: "Investigate critical outlier tables".to_string(),
            description: format!(
                "{} table(s) deviate sharply from their playbook peers",
                critical_outliers.len()
            ),
            estimated_impact: "Medium: restores playbook consistency".to_string(),
            affected_tables: critical_outliers,
        });
    }

    RecommendationSection {
        priority,
        quick_wins: QUICK_WINS.iter().map(|s| s.to_string()).collect(),
    }
}

fn join_by_table_id(
    analyses: &[TableAnalysis],
    compliance: &[ComplianceResult],
    outliers: &[OutlierAnalysis],
) -> Vec<DetailedResult> {
    let mut compliance_by_id: HashMap<&str, VecDeque<&ComplianceResult>> = HashMap::new();
    for result in compliance {
        compliance_by_id
            .entry(result.table_id.as_str())
            .or_default()
            .push_back(result);
    }
    let mut outliers_by_id: HashMap<&str, VecDeque<&OutlierAnalysis>> = HashMap::new();
    for result in outliers {
        outliers_by_id
            .entry(result.table_id.as_str())
            .or_default()
            .push_back(result);
    }

    let mut detailed = Vec::with_capacity(analyses.len());
    for analysis in analyses {
        let matched_compliance = compliance_by_id
            .get_mut(analysis.table_id.as_str())
            .and_then(VecDeque::pop_front);
        let matched_outliers = outliers_by_id
            .get_mut(normalize_table_id(&analysis.table_id).as_str())
            .and_then(VecDeque::pop_front);

        match (matched_compliance, matched_outliers) {
            (Some(compliance), Some(outliers)) => {
                detailed.push(detailed_result(analysis, compliance, outliers))
            }
            _ => log::debug!("{}: incomplete results, left out of detail", analysis.table_id),
        }
    }
    detailed
}

fn join_by_position(
    analyses: &[TableAnalysis],
    compliance: &[ComplianceResult],
    outliers: &[OutlierAnalysis],
) -> Vec<DetailedResult> {
    analyses
        .iter()
        .zip(compliance)
        .zip(outliers)
        .map(|((analysis, compliance), outliers)| detailed_result(analysis, compliance, outliers))
        .collect()
}

fn detailed_result(
    analysis: &TableAnalysis,
    compliance: &ComplianceResult,
    outliers: &OutlierAnalysis,
) -> DetailedResult {
    DetailedResult {
        table_id: analysis.table_id.clone(),
        playbook: analysis.playbook.clone(),
        analysis: analysis.clone(),
        compliance: compliance.clone(),
        outliers: outliers.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::GuardrailChecker;
    use crate::outliers::OutlierDetector;
    use crate::simulation::{create_default_config, discover_tables, SimulationConfig, SimulationRunner};

    struct Fixture {
        analyses: Vec<TableAnalysis>,
        compliance: Vec<ComplianceResult>,
        outliers: Vec<OutlierAnalysis>,
    }

    fn fixture(tables: usize) -> Fixture {
        let config = SimulationConfig {
            sample_size: 400,
            ..create_default_config()
        };
        let result = SimulationRunner::new(config).run_analysis(&discover_tables()[..tables]);
        let outliers = OutlierDetector::new().detect_outliers(&result.analyses);
        Fixture {
            analyses: result.analyses,
            compliance: result.compliance,
            outliers,
        }
    }

    fn context() -> ReportContext {
        ReportContext {
            sample_size: 400,
            seed: 12345,
            fingerprint: None,
        }
    }

    #[test]
    fn test_detailed_results_skip_missing_entries() {
        let f = fixture(5);
        for join in [ResultJoin::ByTableId, ResultJoin::Positional] {
            let report = ReportGenerator::with_join(join).generate_report(
                &f.analyses,
                &f.compliance,
                &f.outliers[..3],
                10.0,
                &context(),
            );
            assert_eq!(report.detailed_results.len(), 3);
            assert_eq!(report.metadata.total_tables, 5);
        }
    }

    #[test]
    fn test_join_by_table_id_survives_reordering() {
        let f = fixture(4);
        let mut compliance = f.compliance.clone();
        compliance.reverse();

        let report = ReportGenerator::new().generate_report(
            &f.analyses,
            &compliance,
            &f.outliers,
            10.0,
            &context(),
        );
        assert_eq!(report.detailed_results.len(), 4);
        for detail in &report.detailed_results {
            assert_eq!(detail.compliance.table_id, detail.analysis.table_id);
            assert_eq!(detail.outliers.table_id, normalize_table_id(&detail.table_id));
        }

        let positional = ReportGenerator::with_join(ResultJoin::Positional).generate_report(
            &f.analyses,
            &compliance,
            &f.outliers,
            10.0,
            &context(),
        );
        assert_ne!(
            positional.detailed_results[0].compliance.table_id,
            positional.detailed_results[0].analysis.table_id
        );
    }

    #[test]
    fn test_empty_run_reports_zero_score() {
        let report = ReportGenerator::new().generate_report(&[], &[], &[], 0.0, &context());
        assert_eq!(report.summary.average_score, 0.0);
        assert_eq!(report.summary.overall_health, HealthStatus::Critical);
        assert!(report.detailed_results.is_empty());
        assert!(report.recommendations.priority.is_empty());
        assert_eq!(report.recommendations.quick_wins.len(), 3);
        assert_eq!(report.outliers.recommendations.len(), 3);
        assert_eq!(report.compliance.trends.len(), 2);
        assert!(serde_json::to_string(&report).is_ok());
    }

    #[test]
    fn test_health_ladder() {
        assert_eq!(classify_health(95.0, 0, 2), HealthStatus::Excellent);
        assert_eq!(classify_health(95.0, 1, 2), HealthStatus::Fair);
        assert_eq!(classify_health(85.0, 0, 0), HealthStatus::Good);
        assert_eq!(classify_health(85.0, 0, 1), HealthStatus::Fair);
        assert_eq!(classify_health(75.0, 3, 5), HealthStatus::Poor);
        assert_eq!(classify_health(65.0, 0, 5), HealthStatus::Poor);
        assert_eq!(classify_health(59.9, 0, 0), HealthStatus::Critical);
    }

    #[test]
    fn test_summary_counts_match_inputs() {
        let f = fixture(8);
        let report = ReportGenerator::new().generate_report(
            &f.analyses,
            &f.compliance,
            &f.outliers,
            10.0,
            &context(),
        );
        let s = &report.summary;
        assert_eq!(
            s.compliant_tables
                + s.warning_tables
                + f.compliance
                    .iter()
                    .filter(|c| c.overall >= ComplianceStatus::Violation)
                    .count(),
            8
        );
        let by_playbook_total: usize = report
            .compliance
            .by_playbook
            .values()
            .map(|p| p.total_tables)
            .sum();
        assert_eq!(by_playbook_total, 8);
        assert!(report.compliance.top_issues.len() <= 5);
        assert!(report
            .compliance
            .top_issues
            .windows(2)
            .all(|w| w[0].count >= w[1].count));
    }

    /// West Coast pass table inside every guardrail.
    fn balanced(offense: &str) -> TableAnalysis {
        let info = crate::analysis::TableInfo::new("West Coast", offense, "COVER_2");
        let mut a = TableAnalysis::sentinel(&info);
        a.sample_size = 10_000;
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
    fn test_priority_recommendations_are_greedy() {
        let mut critical = balanced("QUICK_PASS");
        critical.explosive_rate = 90.0;
        let mut stacked = balanced("SCREEN_PASS");
        stacked.turnover_rate = 26.0;
        stacked.penalty_rate = 19.0;
        stacked.red_zone_efficiency = 62.0;
        let analyses = vec![critical, stacked, balanced("DEEP_PASS")];

        let compliance = GuardrailChecker::new().check_batch_compliance(&analyses);
        assert_eq!(compliance[0].overall, ComplianceStatus::Critical);
        assert_eq!(compliance[1].overall, ComplianceStatus::Violation);
        assert_eq!(compliance[1].violations.len(), 3);
        assert_eq!(compliance[2].overall, ComplianceStatus::Compliant);

        let mut outliers = OutlierDetector::new().detect_outliers(&analyses);
        outliers[2].severity = ViolationSeverity::Critical;

        let report = ReportGenerator::new().generate_report(
            &analyses,
            &compliance,
            &outliers,
            10.0,
            &context(),
        );
        let priority = &report.recommendations.priority;
        assert_eq!(priority.len(), 3);
        assert_eq!(
            priority.iter().map(|p| p.priority).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(priority[0].affected_tables, vec![analyses[0].table_id.clone()]);
        assert_eq!(priority[1].affected_tables, vec![analyses[1].table_id.clone()]);
        assert_eq!(priority[2].category, "outliers");
        assert_eq!(priority[2].affected_tables, vec!["West Coast/deep-pass".to_string()]);
        assert!(report.summary.risk_level.starts_with("High risk"));
    }

    #[test]
    fn test_describe_guardrail() {
        assert!(describe_guardrail("sackRate").contains("4-8%"));
        assert!(describe_guardrail("airRaid.avgGain").contains("airRaid identity"));
        assert!(describe_guardrail("mystery").starts_with("No description"));
    }
}
