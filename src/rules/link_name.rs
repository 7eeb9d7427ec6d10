// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link name rule - WCAG 2.4.4 Link Purpose (In Context) (Level A)
//!
//! Every `<a href>` needs an accessible name that says where it goes.
//! The name is computed from, in order: `aria-labelledby`, `aria-label`,
//! child image alt plus text content, then `title`.

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::{ElementRef, Selector};

pub const RULE_ID: &str = "link-name";

/// Link text that says nothing about the destination
const GENERIC_LINK_TEXTS: &[&str] = &[
    "click here", "clique aqui", "here", "aqui", "read more", "leia mais", "saiba mais", "more",
    "see more", "ver mais", "continue", "continuar", "link", "page", "página", "next", "previous",
    "próximo", "anterior",
];

pub struct LinkNameRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("2.4.4", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("Links must have an accessible name (text, aria-label or aria-labelledby)")
        .with_check(LinkNameRule)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Simplified accessible name computation for a link
pub fn accessible_name(document: &Document, link: &ElementRef<'_>) -> String {
    if let Some(label) = link
        .value()
        .attr("aria-labelledby")
        .and_then(|id| document.element_by_id(id.trim()))
    {
        return collapse_whitespace(&label.text().collect::<String>());
    }

    if let Some(label) = link.value().attr("aria-label").filter(|l| !l.trim().is_empty()) {
        return label.trim().to_string();
    }

    let mut text = String::new();
    if let Ok(img) = Selector::parse("img[alt]") {
        if let Some(alt) = link.select(&img).next().and_then(|i| i.value().attr("alt")) {
            text.push_str(alt);
            text.push(' ');
        }
    }
    text.push_str(&link.text().collect::<String>());
    let text = collapse_whitespace(&text);

    if text.is_empty() {
        if let Some(title) = link.value().attr("title") {
            return title.trim().to_string();
        }
    }
    text
}

fn name_problem(name: &str, href: &str) -> Option<String> {
    if name.is_empty() {
        return Some(
            "This link has no visible text or accessible label. Add descriptive text, an aria-label, or alt text on child images."
                .to_string(),
        );
    }
    if name.chars().count() <= 2 {
        return Some(format!(
            "The link text \"{}\" is too short. Describe the destination or purpose of the link.",
            name
        ));
    }
    if GENERIC_LINK_TEXTS.contains(&name.to_lowercase().as_str()) {
        return Some(format!(
            "The link text \"{}\" is too generic. Say where the link goes, e.g. \"Read more about accessibility\".",
            name
        ));
    }
    if name == href || name == "#" {
        return Some("The link text is only the URL. Add text describing the destination or action.".to_string());
    }
    None
}

#[async_trait(?Send)]
impl Check for LinkNameRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let nodes = document
            .select("a[href]")?
            .iter()
            .filter_map(|link| {
                let href = link.value().attr("href").unwrap_or_default();
                let name = accessible_name(document, link);
                name_problem(&name, href).map(|help| RawNode::for_element(utils, link, help))
            })
            .collect();
        Ok(RawResult::from_nodes(nodes))
    }
}
