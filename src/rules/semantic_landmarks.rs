// SPDX-License-Identifier: PMPL-1.0-or-later
//! Semantic landmarks rule - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! Checks that the page is structured with HTML5 landmarks:
//! - exactly one `<main>` (or `role="main"`)
//! - menus of links inside `<nav>` rather than a classed `<div>`
//! - page header and footer regions using `<header>`/`<footer>`
//! - large top-level content wrappers that should be a landmark

use crate::dom::{select_within, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

pub const RULE_ID: &str = "semantic-landmarks";

/// Links a classed container needs before it reads as a navigation menu
const MENU_MIN_LINKS: usize = 3;

/// Inner HTML size above which a top-level wrapper counts as a content region
const LARGE_REGION_CHARS: usize = 500;

const MENU_LIKE: &str = r#"[class*="menu"], [id*="menu"], [class*="nav"], [id*="nav"]"#;
const HEADER_LIKE: &str = r#"[class*="header"], [id*="header"], [class*="top-bar"], [id*="top"]"#;
const FOOTER_LIKE: &str = r#"[class*="footer"], [id*="footer"], [class*="bottom"], [id*="bottom"]"#;

fn content_class_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)content|main|principal").expect("valid regex"))
}

pub struct SemanticLandmarksRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.3.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("The page must use HTML5 landmarks (<header>, <nav>, <main>, <footer>)")
        .with_check(SemanticLandmarksRule)
}

fn tag(element: &ElementRef<'_>) -> String {
    element.value().name().to_lowercase()
}

/// Elements standing in for a missing landmark, other than `<html>`/`<body>`
fn stand_ins<'a>(document: &'a Document, css: &str) -> anyhow::Result<Vec<ElementRef<'a>>> {
    Ok(document
        .select(css)?
        .into_iter()
        .filter(|e| !matches!(e.value().name(), "html" | "body"))
        .collect())
}

#[async_trait(?Send)]
impl Check for SemanticLandmarksRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        let mains = document.select(r#"main, [role="main"]"#)?;
        if mains.is_empty() {
            nodes.push(
                RawNode::new()
                    .with_selector("body")
                    .with_snippet("<body>...</body>")
                    .with_help(
                        "Wrap the primary content in a <main> element so screen reader users can jump straight to it, e.g. <main><h1>Title</h1>...</main>.",
                    ),
            );
        } else {
            for extra in mains.iter().skip(1) {
                nodes.push(RawNode::for_element(
                    utils,
                    extra,
                    format!(
                        "Found {} <main> elements. A page has exactly one; use <section> or <article> for other content areas.",
                        mains.len()
                    ),
                ));
            }
        }

        if document.select(r#"nav, [role="navigation"]"#)?.is_empty() {
            for element in stand_ins(document, MENU_LIKE)? {
                if select_within(&element, "a[href]")?.len() >= MENU_MIN_LINKS {
                    nodes.push(RawNode::for_element(
                        utils,
                        &element,
                        format!(
                            "This <{}> looks like a navigation menu. Use the <nav> element for menus, e.g. <nav><ul><li><a href=\"...\">Link</a></li></ul></nav>.",
                            tag(&element)
                        ),
                    ));
                }
            }
        }

        if document.select(r#"header, [role="banner"]"#)?.is_empty() {
            for element in stand_ins(document, HEADER_LIKE)? {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "This <{}> looks like the page header. Use the <header> element for the main page header.",
                        tag(&element)
                    ),
                ));
            }
        }

        if document.select(r#"footer, [role="contentinfo"]"#)?.is_empty() {
            for element in stand_ins(document, FOOTER_LIKE)? {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "This <{}> looks like the page footer. Use the <footer> element for the page footer.",
                        tag(&element)
                    ),
                ));
            }
        }

        if let Some(body) = document.body() {
            for child in body.children().filter_map(ElementRef::wrap) {
                let value = child.value();
                if !matches!(value.name(), "div" | "section") || value.attr("role").is_some() {
                    continue;
                }
                let content_class = value
                    .attr("class")
                    .is_some_and(|c| content_class_regex().is_match(c));
                if content_class && child.inner_html().chars().count() > LARGE_REGION_CHARS {
                    nodes.push(RawNode::for_element(
                        utils,
                        &child,
                        format!(
                            "This <{}> appears to hold the main content without a landmark. Use <main>, <article> or <section> with an appropriate role.",
                            tag(&child)
                        ),
                    ));
                }
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
