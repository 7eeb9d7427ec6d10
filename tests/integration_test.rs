// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for wcag-auditor

use std::path::Path;
use std::rc::Rc;
use wcag_auditor::config::{ConfigStore, FileConfigStore, UserConfig};
use wcag_auditor::engine::AuditRunner;
use wcag_auditor::report::{flatten, generate_batch_report, generate_report, OutputFormat, Statistics};
use wcag_auditor::rules::register_builtin_rules;
use wcag_auditor::scanner;
use wcag_auditor::wcag::WcagLevel;

fn runner() -> AuditRunner {
    let mut runner = AuditRunner::new();
    register_builtin_rules(&mut runner).expect("built-in rules register");
    runner
}

fn rule_ids(report: &wcag_auditor::report::AuditReport) -> Vec<&str> {
    report.violations.iter().map(|v| v.rule_id.as_str()).collect()
}

#[tokio::test]
async fn test_scan_accessible_fixture() {
    let config = UserConfig::new(WcagLevel::AAA);
    let report = scanner::scan_file(&mut runner(), Path::new("tests/fixtures/accessible.html"), Some(&config))
        .await
        .expect("scan should succeed");

    assert!(
        report.violations.is_empty(),
        "Accessible fixture should have no violations, got {:?}",
        rule_ids(&report)
    );
    assert_eq!(report.metadata.stats.executed, 16);
}

#[tokio::test]
async fn test_scan_inaccessible_fixture() {
    let config = UserConfig::new(WcagLevel::AAA);
    let report = scanner::scan_file(&mut runner(), Path::new("tests/fixtures/inaccessible.html"), Some(&config))
        .await
        .expect("scan should succeed");

    assert_eq!(
        rule_ids(&report),
        vec![
            "page-title",
            "lang-html",
            "img-alt",
            "heading-order",
            "link-name",
            "color-contrast",
            "color-contrast-enhanced",
            "multiple-ways",
            "text-spacing",
            "images-of-text",
            "alt-indicates-longdesc",
            "icon-labels",
            "semantic-landmarks",
            "links-vs-buttons",
            "keyboard-operable",
            "focus-trap",
        ]
    );
    let count = |id: &str| report.violations.iter().find(|v| v.rule_id == id).map(|v| v.node_count());
    assert_eq!(count("img-alt"), Some(3));
    assert_eq!(count("link-name"), Some(3));
    assert_eq!(count("color-contrast"), Some(1));
    assert_eq!(count("color-contrast-enhanced"), Some(2));
    assert_eq!(count("focus-trap"), Some(2));
    for id in [
        "multiple-ways",
        "text-spacing",
        "images-of-text",
        "alt-indicates-longdesc",
        "icon-labels",
        "semantic-landmarks",
        "links-vs-buttons",
        "keyboard-operable",
    ] {
        assert_eq!(count(id), Some(1), "{}", id);
    }
    assert!(report.has_errors());
}

#[tokio::test]
async fn test_wcag_level_filters() {
    let path = Path::new("tests/fixtures/inaccessible.html");
    let mut runner = runner();

    let a = scanner::scan_file(&mut runner, path, Some(&UserConfig::new(WcagLevel::A))).await.unwrap();
    let aa = scanner::scan_file(&mut runner, path, Some(&UserConfig::new(WcagLevel::AA))).await.unwrap();
    let aaa = scanner::scan_file(&mut runner, path, Some(&UserConfig::new(WcagLevel::AAA))).await.unwrap();

    assert_eq!(a.violations.len(), 11);
    assert_eq!(aa.violations.len(), 15);
    assert_eq!(aaa.violations.len(), 16);
    assert!(a.violations.iter().all(|v| v.wcag.level == WcagLevel::A));
    assert_eq!(aa.metadata.stats.skipped_level, 1);
}

#[tokio::test]
async fn test_disabled_rule_is_not_reported() {
    let config = UserConfig::new(WcagLevel::AAA).with_rule("img-alt", false);
    let report = scanner::scan_file(&mut runner(), Path::new("tests/fixtures/inaccessible.html"), Some(&config))
        .await
        .unwrap();
    assert!(!rule_ids(&report).contains(&"img-alt"));
    assert_eq!(report.metadata.stats.skipped_disabled, 1);
}

#[tokio::test]
async fn test_scan_fixtures_directory() {
    let reports = scanner::scan_directory(&mut runner(), Path::new("tests/fixtures"), Some(&UserConfig::default()))
        .await
        .expect("scan should succeed");

    assert_eq!(reports.len(), 4);
    let post = reports
        .iter()
        .find(|r| r.metadata.url.ends_with("post.htm"))
        .expect("nested .htm page scanned");
    assert_eq!(
        rule_ids(post),
        vec!["lang-html", "heading-order", "link-name", "multiple-ways", "semantic-landmarks"]
    );

    let text = generate_batch_report(&reports, OutputFormat::Text);
    assert!(text.contains("Audited 4 page(s)"));
}

#[tokio::test]
async fn test_saved_configuration_drives_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Rc::new(FileConfigStore::new(dir.path().join("config.json")));
    store
        .save_user_config(&UserConfig::new(WcagLevel::A).with_rule("link-name", false))
        .await
        .unwrap();

    let mut runner = runner().with_config_store(store.clone());
    let report = scanner::scan_file(&mut runner, Path::new("tests/fixtures/inaccessible.html"), None)
        .await
        .unwrap();

    assert_eq!(report.metadata.target_level, WcagLevel::A);
    assert_eq!(
        rule_ids(&report),
        vec![
            "page-title",
            "lang-html",
            "img-alt",
            "heading-order",
            "alt-indicates-longdesc",
            "icon-labels",
            "semantic-landmarks",
            "links-vs-buttons",
            "keyboard-operable",
            "focus-trap",
        ]
    );
}

#[tokio::test]
async fn test_json_and_csv_exports() {
    let config = UserConfig::new(WcagLevel::AAA);
    let report = scanner::scan_file(&mut runner(), Path::new("tests/fixtures/inaccessible.html"), Some(&config))
        .await
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&generate_report(&report, OutputFormat::Json)).expect("valid JSON");
    let results = json["results"].as_array().expect("results array");
    assert_eq!(json["metadata"]["totalIssues"], results.len());
    assert_eq!(json["metadata"]["targetLevel"], "AAA");

    let csv = generate_report(&report, OutputFormat::Csv);
    assert_eq!(csv.lines().count(), results.len() + 1);

    // heading-order flags the opening <h3> twice: one row, two occurrences
    let rows = flatten(&report.violations);
    let promo = rows
        .iter()
        .find(|r| r.rule == "heading-order" && r.selector == "h3.promo")
        .expect("h3 row");
    assert_eq!(promo.occurrences, 2);

    let stats = Statistics::from_rows(&rows);
    assert_eq!(stats.total, rows.len());
    assert_eq!(stats.by_level[&WcagLevel::AAA], 2);
}

#[tokio::test]
async fn test_text_report_format() {
    let report = scanner::scan_file(&mut runner(), Path::new("tests/fixtures/inaccessible.html"), None)
        .await
        .unwrap();
    let text = generate_report(&report, OutputFormat::Text);

    assert!(text.contains("WCAG Audit Report"));
    assert!(text.contains("Level AA"));
    assert!(text.contains("RESULT: FAIL"));
}
