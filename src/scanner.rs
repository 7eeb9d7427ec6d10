// SPDX-License-Identifier: PMPL-1.0-or-later
//! Directory scanner for auditing the HTML pages of a project.
//!
//! Walks directory trees, picks up HTML files, and runs the registered rules
//! against each one.

use crate::config::UserConfig;
use crate::dom::Document;
use crate::engine::AuditRunner;
use crate::error::Result;
use crate::report::AuditReport;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// File extensions to scan
const SCANNABLE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &["node_modules", ".git", "target", "dist", "build"];

fn is_scannable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCANNABLE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Address recorded for a page loaded from disk
async fn file_url(path: &Path) -> String {
    let absolute = tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// HTML files below `dir`, in a stable order
pub fn collect_pages(dir: &Path) -> Vec<PathBuf> {
    let mut pages: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden and excluded directories, but never the root itself
            if e.depth() > 0 && e.file_type().is_dir() {
                let name = e.file_name().to_str().unwrap_or("");
                return !SKIP_DIRS.contains(&name) && !name.starts_with('.');
            }
            true
        })
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_scannable(e.path()))
        .map(|e| e.into_path())
        .collect();
    pages.sort();
    pages
}

/// Audit a single HTML file
pub async fn scan_file(
    runner: &mut AuditRunner,
    path: &Path,
    config: Option<&UserConfig>,
) -> Result<AuditReport> {
    let content = tokio::fs::read_to_string(path).await?;
    let document = Document::parse(&content).with_url(file_url(path).await);
    let outcome = runner.run_with_stats(&document, config).await;
    Ok(AuditReport::new(&document, outcome))
}

/// Audit every HTML file below a directory; unreadable files are skipped
pub async fn scan_directory(
    runner: &mut AuditRunner,
    dir: &Path,
    config: Option<&UserConfig>,
) -> Result<Vec<AuditReport>> {
    info!("Scanning directory: {}", dir.display());

    let mut reports = Vec::new();
    for path in collect_pages(dir) {
        match scan_file(runner, &path, config).await {
            Ok(report) => reports.push(report),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping page"),
        }
    }

    let violations: usize = reports.iter().map(|r| r.metadata.total_violations).sum();
    info!("Scanned {} page(s), {} flagged element(s)", reports.len(), violations);

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::register_builtin_rules;
    use crate::wcag::WcagLevel;
    use tempfile::TempDir;

    fn runner() -> AuditRunner {
        let mut runner = AuditRunner::new();
        register_builtin_rules(&mut runner).unwrap();
        runner
    }

    #[tokio::test]
    async fn test_scan_nonexistent_dir() {
        let result = scan_directory(&mut runner(), Path::new("/nonexistent/path"), None).await;
        // walkdir reports the missing root as an entry error
        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collect_skips_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        for sub in ["site", "node_modules", ".cache", "build"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("index.html"), "<html></html>").unwrap();
        }
        std::fs::write(dir.path().join("about.HTM"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("style.css"), "p {}").unwrap();

        let pages = collect_pages(dir.path());
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().any(|p| p.ends_with("site/index.html")));
        assert!(pages.iter().any(|p| p.ends_with("about.HTM")));
    }

    #[tokio::test]
    async fn test_scan_file_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(
            &path,
            r#"<html lang="en"><head><title>Welcome to the shop</title></head><body><img src="x.png"></body></html>"#,
        )
        .unwrap();

        let config = UserConfig::new(WcagLevel::AA);
        let report = scan_file(&mut runner(), &path, Some(&config)).await.unwrap();
        assert!(report.metadata.url.starts_with("file://"));
        assert_eq!(report.metadata.title.as_deref(), Some("Welcome to the shop"));
        let ids: Vec<_> = report.violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["img-alt", "multiple-ways", "semantic-landmarks"]);
    }

    #[tokio::test]
    async fn test_file_url_is_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("..").join("page.html");
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("page.html"), "<html></html>").unwrap();

        let url = file_url(&path).await;
        let expected = std::fs::canonicalize(dir.path().join("page.html")).unwrap();
        assert_eq!(url, format!("file://{}", expected.display()));

        // Unresolvable paths are recorded as given
        assert_eq!(file_url(Path::new("missing/page.html")).await, "file://missing/page.html");
    }

    #[tokio::test]
    async fn test_scan_missing_file_is_error() {
        let result = scan_file(&mut runner(), Path::new("/nonexistent/page.html"), None).await;
        assert!(result.is_err());
    }
}
