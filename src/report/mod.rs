// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for audit results.
//!
//! Supports multiple output formats:
//! - Text: human-readable violations with KPIs and WCAG criterion references
//! - JSON: the flat `{ metadata, results }` export
//! - CSV: the flat export as spreadsheet rows

pub mod export;
pub mod summary;

pub use export::{flatten, ExportRow};
pub use summary::{rule_filter_options, LevelCounts, LevelKpis, Statistics, ViolationFilter};

use crate::dom::Document;
use crate::engine::{NormalizedViolation, RunOutcome, RunStats};
use crate::wcag::WcagLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Marker text of a transport failure caused by a missing page-side auditor
const MISSING_RECEIVER: &str = "Receiving end does not exist";

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Flat JSON export
    Json,
    /// Flat CSV export
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Who, what and when of one page audit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    pub run_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub target_level: WcagLevel,
    /// Flagged nodes over all violations
    pub total_violations: usize,
    pub stats: RunStats,
}

/// Results of auditing one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub metadata: AuditMetadata,
    pub violations: Vec<NormalizedViolation>,
}

impl AuditReport {
    pub fn new(document: &Document, outcome: RunOutcome) -> Self {
        let total_violations = outcome.violations.iter().map(NormalizedViolation::node_count).sum();
        Self {
            metadata: AuditMetadata {
                run_id: Uuid::new_v4(),
                url: document.url().unwrap_or_default().to_string(),
                title: document.title().filter(|t| !t.is_empty()),
                timestamp: Utc::now(),
                target_level: outcome.config.target_level,
                total_violations,
                stats: outcome.stats,
            },
            violations: outcome.violations,
        }
    }

    pub fn kpis(&self) -> LevelKpis {
        LevelKpis::from_violations(&self.violations)
    }

    pub fn rows(&self) -> Vec<ExportRow> {
        flatten(&self.violations)
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity.is_error())
    }
}

/// Generate a report for one page
pub fn generate_report(report: &AuditReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(report),
        OutputFormat::Json => export::to_json(&report.metadata, &report.rows()).unwrap_or_else(json_error),
        OutputFormat::Csv => export::to_csv(&report.rows()),
    }
}

/// Generate one report covering several pages
pub fn generate_batch_report(reports: &[AuditReport], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output: Vec<String> = reports.iter().map(generate_text_report).collect();
            output.push(format!("Audited {} page(s)\n", reports.len()));
            output.join("\n")
        }
        OutputFormat::Json => {
            let rows: Vec<Vec<ExportRow>> = reports.iter().map(AuditReport::rows).collect();
            export::to_json_batch(
                reports.iter().zip(&rows).map(|(r, rows)| (&r.metadata, rows.as_slice())),
            )
            .unwrap_or_else(json_error)
        }
        OutputFormat::Csv => {
            let rows: Vec<ExportRow> = reports.iter().flat_map(AuditReport::rows).collect();
            export::to_csv(&rows)
        }
    }
}

fn json_error(e: serde_json::Error) -> String {
    format!("{{\"error\": \"Failed to serialize report: {}\"}}", e)
}

/// Generate human-readable text report
fn generate_text_report(report: &AuditReport) -> String {
    let mut output = String::new();
    let meta = &report.metadata;

    output.push_str("=== WCAG Audit Report ===\n\n");
    output.push_str(&format!("Page: {}\n", if meta.url.is_empty() { "<unknown>" } else { meta.url.as_str() }));
    if let Some(ref title) = meta.title {
        output.push_str(&format!("Title: {}\n", title));
    }
    output.push_str(&format!("Target level: {}\n", meta.target_level));
    output.push_str(&format!("Run: {} at {}\n\n", meta.run_id, meta.timestamp.to_rfc3339()));

    if report.violations.is_empty() {
        output.push_str("No accessibility violations found. All checks passed.\n");
        return output;
    }

    let kpis = report.kpis();
    output.push_str(&format!(
        "Found {} violated rule(s), {} flagged element(s): {} error(s), {} warning(s)\n",
        report.violations.len(),
        meta.total_violations,
        kpis.total_errors(),
        kpis.total_warnings()
    ));
    for level in WcagLevel::ALL {
        let counts = kpis.get(level);
        output.push_str(&format!(
            "  Level {:<3}  errors: {:>3}  warnings: {:>3}\n",
            level.as_str(),
            counts.errors,
            counts.warnings
        ));
    }
    output.push('\n');

    for violation in &report.violations {
        output.push_str(&format!("[{}] {}\n", violation.rule_id, violation.description));
        output.push_str(&format!(
            "  WCAG: {} (Level {}) - {}\n",
            violation.wcag.id, violation.wcag.level, violation.severity
        ));
        output.push_str(&format!("  Reference: {}\n", violation.wcag.help_url()));

        for node in &violation.nodes {
            output.push_str(&format!("  - {}\n", node.selector));
            if !node.snippet.is_empty() {
                output.push_str(&format!("    {}\n", node.snippet));
            }
            output.push_str(&format!("    Fix: {}\n", node.help));
        }
        output.push('\n');
    }

    if report.has_errors() {
        output.push_str("RESULT: FAIL (errors found)\n");
    } else {
        output.push_str("RESULT: PASS WITH WARNINGS\n");
    }

    output
}

/// User-facing text for a failed audit request
pub fn failure_message(error: &str) -> String {
    if error.contains(MISSING_RECEIVER) {
        "The page-side auditor is not loaded.\n\nReload the page and try again. \
         If the problem persists, reload the extension."
            .to_string()
    } else {
        format!("Error communicating with the page: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;
    use crate::engine::ViolationNode;
    use crate::error::TransportError;
    use crate::wcag::{Severity, WcagRef};

    fn sample_report(violations: Vec<NormalizedViolation>) -> AuditReport {
        let document = Document::parse("<html><head><title>Shop</title></head></html>")
            .with_url("https://shop.example/");
        AuditReport::new(
            &document,
            RunOutcome {
                violations,
                stats: RunStats::default(),
                config: UserConfig::default(),
            },
        )
    }

    fn sample_violation(severity: Severity) -> NormalizedViolation {
        NormalizedViolation {
            rule_id: "img-alt".to_string(),
            wcag: WcagRef::new("1.1.1", WcagLevel::A),
            severity,
            description: "Images need alternative text".to_string(),
            nodes: vec![ViolationNode {
                selector: "#logo".to_string(),
                snippet: "<img id=\"logo\">".to_string(),
                help: "Add an alt attribute".to_string(),
            }],
        }
    }

    #[test]
    fn test_report_metadata() {
        let report = sample_report(vec![sample_violation(Severity::Error)]);
        assert_eq!(report.metadata.url, "https://shop.example/");
        assert_eq!(report.metadata.title.as_deref(), Some("Shop"));
        assert_eq!(report.metadata.target_level, WcagLevel::AA);
        assert_eq!(report.metadata.total_violations, 1);
    }

    #[test]
    fn test_text_report_empty() {
        let report = generate_report(&sample_report(Vec::new()), OutputFormat::Text);
        assert!(report.contains("No accessibility violations found"));
    }

    #[test]
    fn test_text_report_with_violations() {
        let report = generate_report(&sample_report(vec![sample_violation(Severity::Error)]), OutputFormat::Text);
        assert!(report.contains("[img-alt]"));
        assert!(report.contains("#logo"));
        assert!(report.contains("Fix: Add an alt attribute"));
        assert!(report.contains("RESULT: FAIL"));

        let report = generate_report(&sample_report(vec![sample_violation(Severity::Warn)]), OutputFormat::Text);
        assert!(report.contains("PASS WITH WARNINGS"));
    }

    #[test]
    fn test_json_report() {
        let report = generate_report(&sample_report(vec![sample_violation(Severity::Error)]), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(parsed["metadata"]["url"], "https://shop.example/");
        assert_eq!(parsed["metadata"]["totalIssues"], 1);
        assert_eq!(parsed["metadata"]["targetLevel"], "AA");
        assert_eq!(parsed["results"][0]["rule"], "img-alt");
        assert_eq!(parsed["results"][0]["wcag"], "1.1.1 (A)");
        assert_eq!(parsed["results"][0]["helpUrl"], "https://www.w3.org/WAI/WCAG21/Understanding/1.1.1");
        assert!(parsed["results"][0].get("occurrences").is_none());
    }

    #[test]
    fn test_batch_reports() {
        let reports = vec![sample_report(Vec::new()), sample_report(vec![sample_violation(Severity::Error)])];
        let json: serde_json::Value =
            serde_json::from_str(&generate_batch_report(&reports, OutputFormat::Json)).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);

        let csv = generate_batch_report(&reports, OutputFormat::Csv);
        assert_eq!(csv.lines().count(), 2);

        let text = generate_batch_report(&reports, OutputFormat::Text);
        assert!(text.contains("Audited 2 page(s)"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_failure_message_reload_hint() {
        let missing = TransportError::ReceiverUnavailable("tab 3".to_string()).to_string();
        assert!(failure_message(&missing).contains("Reload the page"));
        assert_eq!(
            failure_message("No active target found"),
            "Error communicating with the page: No active target found"
        );
    }
}
