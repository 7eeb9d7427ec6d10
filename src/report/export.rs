// SPDX-License-Identifier: PMPL-1.0-or-later
//! Flat JSON and CSV exports.
//!
//! Violations are flattened to one row per distinct (rule, selector) pair;
//! repeated pairs only bump the row's occurrence count.

use crate::engine::NormalizedViolation;
use crate::report::AuditMetadata;
use crate::wcag::{Severity, WcagLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Byte-order mark prepended to CSV files so spreadsheets pick up UTF-8
pub const CSV_BOM: &str = "\u{FEFF}";

pub const CSV_HEADERS: [&str; 9] = [
    "Regra",
    "WCAG",
    "Nível",
    "Severidade",
    "Seletor",
    "Snippet",
    "Mensagem",
    "URL de Ajuda",
    "Ocorrências",
];

/// One exported finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub rule: String,
    /// Criterion with its level, e.g. "1.1.1 (A)"
    pub wcag: String,
    pub level: WcagLevel,
    pub severity: Severity,
    pub selector: String,
    pub snippet: String,
    pub message: String,
    pub help_url: String,
    #[serde(skip)]
    pub occurrences: usize,
}

/// Flatten and deduplicate violations, keeping first-seen order
pub fn flatten(violations: &[NormalizedViolation]) -> Vec<ExportRow> {
    let mut rows: Vec<ExportRow> = Vec::new();
    let mut seen: HashMap<(String, String), usize> = HashMap::new();

    for violation in violations {
        for node in &violation.nodes {
            let key = (violation.rule_id.clone(), node.selector.clone());
            if let Some(&slot) = seen.get(&key) {
                rows[slot].occurrences += 1;
                continue;
            }
            seen.insert(key, rows.len());
            rows.push(ExportRow {
                rule: violation.rule_id.clone(),
                wcag: violation.wcag.to_string(),
                level: violation.wcag.level,
                severity: violation.severity,
                selector: node.selector.clone(),
                snippet: node.snippet.clone(),
                message: violation.description.clone(),
                help_url: violation.wcag.help_url(),
                occurrences: 1,
            });
        }
    }
    rows
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportMetadata<'a> {
    run_id: String,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    timestamp: DateTime<Utc>,
    total_issues: usize,
    target_level: WcagLevel,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata<'a>,
    results: &'a [ExportRow],
}

fn export_document<'a>(metadata: &'a AuditMetadata, rows: &'a [ExportRow]) -> ExportDocument<'a> {
    ExportDocument {
        metadata: ExportMetadata {
            run_id: metadata.run_id.to_string(),
            url: &metadata.url,
            title: metadata.title.as_deref(),
            timestamp: metadata.timestamp,
            total_issues: rows.len(),
            target_level: metadata.target_level,
        },
        results: rows,
    }
}

/// `{ metadata, results }` document, pretty printed
pub fn to_json(metadata: &AuditMetadata, rows: &[ExportRow]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_document(metadata, rows))
}

/// JSON array with one export document per page
pub fn to_json_batch<'a>(
    pages: impl IntoIterator<Item = (&'a AuditMetadata, &'a [ExportRow])>,
) -> serde_json::Result<String> {
    let documents: Vec<_> = pages
        .into_iter()
        .map(|(metadata, rows)| export_document(metadata, rows))
        .collect();
    serde_json::to_string_pretty(&documents)
}

/// Quote a value when it contains a comma, a quote or a line break
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header plus one line per row, without the BOM
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut lines = vec![CSV_HEADERS.join(",")];
    for row in rows {
        let fields = [
            escape_csv(&row.rule),
            escape_csv(&row.wcag),
            escape_csv(row.level.as_str()),
            escape_csv(row.severity.as_str()),
            escape_csv(&row.selector),
            escape_csv(&row.snippet),
            escape_csv(&row.message),
            escape_csv(&row.help_url),
            row.occurrences.to_string(),
        ];
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// Download-style file name, e.g. `wcag-audit-2024-05-01T10-20-30.csv`
pub fn export_filename(timestamp: DateTime<Utc>, extension: &str) -> String {
    format!("wcag-audit-{}.{}", timestamp.format("%Y-%m-%dT%H-%M-%S"), extension)
}

/// Write a CSV export, BOM first
pub async fn write_csv(path: &Path, rows: &[ExportRow]) -> std::io::Result<()> {
    tokio::fs::write(path, format!("{}{}", CSV_BOM, to_csv(rows))).await
}
