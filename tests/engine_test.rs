// SPDX-License-Identifier: PMPL-1.0-or-later
//! Registering custom rules alongside the built-in set

use async_trait::async_trait;
use wcag_auditor::config::UserConfig;
use wcag_auditor::dom::{Document, NodeUtils};
use wcag_auditor::engine::AuditRunner;
use wcag_auditor::rules::{check_fn, register_builtin_rules, Check, RawNode, RawResult, RuleSpec};
use wcag_auditor::wcag::{Severity, WcagLevel};
use wcag_auditor::AuditError;

/// Flags buttons without text
struct ButtonNameRule;

#[async_trait(?Send)]
impl Check for ButtonNameRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let nodes = document
            .select("button")?
            .iter()
            .filter(|b| b.text().collect::<String>().trim().is_empty() && b.value().attr("aria-label").is_none())
            .map(|b| RawNode::for_element(utils, b, "Give the button a text label"))
            .collect();
        Ok(RawResult::from_nodes(nodes))
    }
}

const PAGE: &str = r#"<html lang="en"><head><title>Checkout page</title></head>
<body><header><nav><a href="/">Home page</a><a href="/cart">Shopping cart</a><a href="/account">Your account</a></nav>
<form role="search"><input type="search" name="q" aria-label="Search products"></form></header>
<main><h1>Checkout</h1><button class="later"></button><button>Pay now</button></main></body></html>"#;

#[tokio::test]
async fn test_custom_rule_runs_after_builtins() {
    let mut runner = AuditRunner::new();
    register_builtin_rules(&mut runner).unwrap();
    runner
        .register(
            "button-name",
            RuleSpec::new()
                .with_wcag("4.1.2", WcagLevel::A)
                .with_severity(Severity::Error)
                .with_description("Buttons must have an accessible name")
                .with_check(ButtonNameRule),
        )
        .unwrap();

    let violations = runner.run(&Document::parse(PAGE), Some(&UserConfig::default())).await;
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_id, "button-name");
    assert_eq!(violations[0].nodes[0].selector, "button.later");
    assert_eq!(violations[0].nodes[0].snippet, r#"<button class="later"></button>"#);
    assert_eq!(runner.list_rules().last().unwrap().id, "button-name");
}

#[tokio::test]
async fn test_invalid_selector_in_rule_is_contained() {
    let mut runner = AuditRunner::new();
    runner
        .register(
            "broken-selector",
            RuleSpec::new().with_check(check_fn(|doc: &Document, _: &NodeUtils| {
                doc.select("div[[")?;
                Ok(RawResult::pass())
            })),
        )
        .unwrap();
    runner.register("button-name", RuleSpec::new().with_check(ButtonNameRule)).unwrap();

    let outcome = runner.run_with_stats(&Document::parse(PAGE), None).await;
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.stats.failed, 1);
}

#[test]
fn test_rule_without_check_is_rejected() {
    let mut runner = AuditRunner::new();
    let err = runner
        .register("no-check", RuleSpec::new().with_wcag("1.1.1", WcagLevel::A))
        .unwrap_err();
    assert!(matches!(err, AuditError::ContractViolation { .. }));
    assert!(runner.is_empty());
}
