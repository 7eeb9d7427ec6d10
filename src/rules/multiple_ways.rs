// SPDX-License-Identifier: PMPL-1.0-or-later
//! Multiple ways rule - WCAG 2.4.5 Multiple Ways (Level AA)
//!
//! A site should offer more than one way to find its pages. The rule looks
//! for the common mechanisms (navigation menu, search, breadcrumbs, site map,
//! table of contents) and warns when fewer than two are present. It detects
//! their presence only, so findings are warnings.

use crate::dom::{select_within, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;

pub const RULE_ID: &str = "multiple-ways";

/// Mechanisms required for the page to pass
const REQUIRED_MECHANISMS: usize = 2;

/// A way of locating pages within a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    Menu,
    Search,
    Breadcrumbs,
    SiteMap,
    Contents,
}

impl Mechanism {
    pub const ALL: [Mechanism; 5] = [
        Mechanism::Menu,
        Mechanism::Search,
        Mechanism::Breadcrumbs,
        Mechanism::SiteMap,
        Mechanism::Contents,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mechanism::Menu => "navigation menu",
            Mechanism::Search => "search field",
            Mechanism::Breadcrumbs => "breadcrumbs",
            Mechanism::SiteMap => "site map or index",
            Mechanism::Contents => "table of contents",
        }
    }

    /// Whether the document offers this mechanism
    pub fn is_present(self, document: &Document) -> anyhow::Result<bool> {
        match self {
            Mechanism::Menu => {
                Ok(any_with_links(document, r#"nav, [role="navigation"]"#, 3)?
                    || any_with_links(
                        document,
                        r#"[class*="menu"], [id*="menu"], [class*="nav"], [id*="nav"], [class*="header"], [id*="header"]"#,
                        3,
                    )?)
            }
            Mechanism::Search => Ok(!document
                .select(concat!(
                    r#"[role="search"], input[type="search"], "#,
                    r#"input[name*="search"], input[name*="busca"], input[name*="query"], "#,
                    r#"input[placeholder*="earch"], input[placeholder*="busca"], input[placeholder*="pesquis"], "#,
                    r#"input[class*="search"], input[class*="busca"], input[id*="search"], input[id*="busca"], "#,
                    r#"form[action*="search"], form[action*="busca"], form[class*="search"], form[class*="busca"]"#
                ))?
                .is_empty()),
            Mechanism::Breadcrumbs => {
                Ok(!document
                    .select(r#"[aria-label*="breadcrumb"], [aria-label*="Breadcrumb"]"#)?
                    .is_empty()
                    || any_with_links(
                        document,
                        r#"[class*="breadcrumb"], [id*="breadcrumb"], [class*="trilha"], [id*="trilha"]"#,
                        2,
                    )?)
            }
            Mechanism::SiteMap => Ok(!document
                .select(concat!(
                    r#"a[href*="sitemap"], a[href*="site-map"], a[href*="mapa"], a[href*="indice"], a[href*="index"], "#,
                    r#"[class*="sitemap"], [id*="sitemap"], [class*="site-map"], [id*="site-map"]"#
                ))?
                .is_empty()),
            Mechanism::Contents => any_with_links(
                document,
                concat!(
                    r#"[role="complementary"], aside, [class*="toc"], [id*="toc"], "#,
                    r#"[class*="table-of-contents"], [id*="table-of-contents"], [class*="indice"], [id*="indice"]"#
                ),
                3,
            ),
        }
    }
}

/// Some element matching `css` contains at least `min_links` links
fn any_with_links(document: &Document, css: &str, min_links: usize) -> anyhow::Result<bool> {
    for element in document.select(css)? {
        if select_within(&element, "a[href]")?.len() >= min_links {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Every mechanism the document offers
pub fn detect_mechanisms(document: &Document) -> anyhow::Result<Vec<Mechanism>> {
    let mut found = Vec::new();
    for mechanism in Mechanism::ALL {
        if mechanism.is_present(document)? {
            found.push(mechanism);
        }
    }
    Ok(found)
}

pub struct MultipleWaysRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("2.4.5", WcagLevel::AA)
        .with_severity(Severity::Warn)
        .with_description("There should be more than one way to locate pages (menu, search, site map, etc.)")
        .with_check(MultipleWaysRule)
}

#[async_trait(?Send)]
impl Check for MultipleWaysRule {
    async fn check(&self, document: &Document, _utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let found = detect_mechanisms(document)?;
        if found.len() >= REQUIRED_MECHANISMS {
            return Ok(RawResult::pass());
        }

        let detected = match found.first() {
            Some(only) => format!("Only a {} was detected.", only.label()),
            None => "No navigation mechanism was detected.".to_string(),
        };
        Ok(RawResult::from_nodes(vec![RawNode::new()
            .with_selector("body")
            .with_snippet("<body> ... (overall page structure)</body>")
            .with_help(format!(
                "{} Offer at least two ways to find pages: a navigation menu, a search field, a site map, breadcrumbs or a table of contents. This check detects presence only; review manually.",
                detected
            ))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"<nav><a href="/">Home</a><a href="/shop">Shop</a><a href="/help">Help</a></nav>"#;

    fn found(html: &str) -> Vec<Mechanism> {
        detect_mechanisms(&Document::parse(html)).unwrap()
    }

    async fn flagged(html: &str) -> Option<String> {
        MultipleWaysRule
            .check(&Document::parse(html), &NodeUtils::new())
            .await
            .unwrap()
            .nodes
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|n| n.help)
    }

    #[test]
    fn test_detects_each_mechanism() {
        assert_eq!(found(MENU), vec![Mechanism::Menu]);
        assert_eq!(found(r#"<form role="search"><input name="q"></form>"#), vec![Mechanism::Search]);
        assert_eq!(found(r#"<input placeholder="Search the site">"#), vec![Mechanism::Search]);
        assert_eq!(
            found(r#"<ol class="breadcrumbs"><li><a href="/">Home</a></li><li><a href="/docs">Docs</a></li></ol>"#),
            vec![Mechanism::Breadcrumbs]
        );
        assert_eq!(found(r#"<a href="/sitemap.xml">All pages</a>"#), vec![Mechanism::SiteMap]);
        assert_eq!(
            found(r##"<aside><a href="#a">A</a><a href="#b">B</a><a href="#c">C</a></aside>"##),
            vec![Mechanism::Contents]
        );
    }

    #[test]
    fn test_short_nav_is_not_a_menu() {
        assert!(found(r#"<nav><a href="/">Home</a><a href="/about">About</a></nav>"#).is_empty());
    }

    #[tokio::test]
    async fn test_two_mechanisms_pass() {
        let html = format!(r#"{}<input type="search" aria-label="Search">"#, MENU);
        assert!(flagged(&html).await.is_none());
    }

    #[tokio::test]
    async fn test_single_mechanism_is_named() {
        let help = flagged(MENU).await.expect("flagged");
        assert!(help.starts_with("Only a navigation menu was detected."));
        let help = flagged("<p>Nothing here</p>").await.expect("flagged");
        assert!(help.starts_with("No navigation mechanism"));
    }
}
