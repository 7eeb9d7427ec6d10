// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page title rule - WCAG 2.4.2 Page Titled (Level A)
//!
//! The document must have a `<title>` that is present, non-empty and longer
//! than a couple of characters.

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;

pub const RULE_ID: &str = "page-title";

/// Shortest title still considered descriptive
const MIN_TITLE_LEN: usize = 3;

pub struct PageTitleRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("2.4.2", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("The page must have a descriptive, non-empty <title>")
        .with_check(PageTitleRule)
}

#[async_trait(?Send)]
impl Check for PageTitleRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let Some(title) = document.select("title")?.into_iter().next() else {
            return Ok(RawResult::from_nodes(vec![RawNode::new()
                .with_selector("head")
                .with_snippet("<head> ... (no <title> element)</head>")
                .with_help("Add a <title> element inside <head> that clearly and uniquely describes the page.")]));
        };

        let text = title.text().collect::<String>();
        let text = text.trim();
        let mut nodes = Vec::new();

        if text.is_empty() {
            nodes.push(
                RawNode::new()
                    .with_selector("title")
                    .with_snippet(utils.snippet_for(&title))
                    .with_help("The <title> element is empty. Add text that identifies the purpose or content of the page."),
            );
        } else if text.chars().count() < MIN_TITLE_LEN {
            nodes.push(
                RawNode::new()
                    .with_selector("title")
                    .with_snippet(utils.snippet_for(&title))
                    .with_help(format!(
                        "The title \"{}\" is too short. Use a title that clearly identifies the page content.",
                        text
                    )),
            );
        }

        Ok(RawResult::from_nodes(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(html: &str) -> RawResult {
        PageTitleRule
            .check(&Document::parse(html), &NodeUtils::new())
            .await
            .expect("check succeeds")
    }

    #[tokio::test]
    async fn test_descriptive_title_passes() {
        let result = run("<html><head><title>Admissions - University</title></head></html>").await;
        assert_eq!(result.node_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_title() {
        let result = run("<html><head></head><body></body></html>").await;
        let nodes = result.nodes.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].selector.as_deref(), Some("head"));
    }

    #[tokio::test]
    async fn test_empty_and_short_titles() {
        assert_eq!(run("<title>   </title>").await.node_count(), 1);
        assert_eq!(run("<title>Hi</title>").await.node_count(), 1);
    }
}
