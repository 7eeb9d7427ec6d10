// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading order rule - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! Headings must descend one level at a time (h1 → h2 → h3) and the first
//! heading on the page must be an `<h1>`.

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;

pub const RULE_ID: &str = "heading-order";

/// Heading text quoted in help messages is cut to this many characters
const QUOTE_LEN: usize = 50;

pub struct HeadingOrderRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.3.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("Headings must follow a logical hierarchy (h1 → h2 → h3) without skipping levels")
        .with_check(HeadingOrderRule)
}

fn heading_level(tag: &str) -> Option<u8> {
    tag.strip_prefix('h')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

#[async_trait(?Send)]
impl Check for HeadingOrderRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();
        let mut previous = 0u8;

        for (index, heading) in document.select("h1, h2, h3, h4, h5, h6")?.iter().enumerate() {
            let Some(current) = heading_level(heading.value().name()) else {
                continue;
            };

            if current > previous + 1 {
                let text: String = heading.text().collect::<String>().trim().chars().take(QUOTE_LEN).collect();
                let mut help = format!(
                    "This <h{current}> jumps from level h{previous} to h{current}. Use <h{}> to keep the hierarchy logical.",
                    previous + 1
                );
                if !text.is_empty() {
                    help.push_str(&format!(" Content: \"{}\"", text));
                }
                nodes.push(RawNode::for_element(utils, heading, help));
            }

            if index == 0 && current != 1 {
                nodes.push(RawNode::for_element(
                    utils,
                    heading,
                    format!("The page starts with <h{current}> but the first heading should be <h1>, the main page title."),
                ));
            }

            previous = current;
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
