// SPDX-License-Identifier: PMPL-1.0-or-later
//! Text spacing rule - WCAG 1.4.12 Text Spacing (Level AA)
//!
//! Users who raise line, letter and word spacing must not lose content.
//! Inline `style` declarations that are likely to clip or squeeze text are
//! flagged: fixed small heights, restrictive `max-height`, `overflow: hidden`,
//! `white-space: nowrap`, tight `line-height` and narrow fixed widths.
//! Stylesheet rules are not resolved, so findings are warnings.

use crate::dom::{css_length_px, style_declarations, text_of, Document, NodeUtils, BASE_FONT_PX};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "text-spacing";

const TEXT_ELEMENTS: &str = "p, div, span, h1, h2, h3, h4, h5, h6, li, td, th, button, a, label, article, section";

/// Report at most this many elements per page
const MAX_NODES: usize = 20;

const MAX_FIXED_HEIGHT_PX: f64 = 500.0;
const MAX_RESTRICTIVE_MAX_HEIGHT_PX: f64 = 200.0;
const MAX_NARROW_WIDTH_PX: f64 = 300.0;
const MIN_LINE_HEIGHT_RATIO: f64 = 1.2;

/// One restrictive declaration found on an element
#[derive(Debug, Clone, PartialEq)]
pub struct SpacingIssue {
    pub property: String,
    pub value: String,
    pub issue: String,
}

impl std::fmt::Display for SpacingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.property, self.value, self.issue)
    }
}

pub struct TextSpacingRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.4.12", WcagLevel::AA)
        .with_severity(Severity::Warn)
        .with_description("Text spacing must be adjustable without loss of content or functionality")
        .with_check(TextSpacingRule)
}

/// A positive fixed length strictly below `limit`
fn fixed_below(value: &str, limit: f64) -> bool {
    css_length_px(value).is_some_and(|px| px > 0.0 && px < limit)
}

/// `line-height` relative to the font size; unitless and percentage values are ratios already
fn line_height_ratio(value: &str, font_px: f64) -> Option<f64> {
    let value = value.trim();
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<f64>().ok().map(|p| p / 100.0);
    }
    if let Ok(ratio) = value.parse::<f64>() {
        return Some(ratio);
    }
    if let Some(em) = value.strip_suffix("em").filter(|v| !v.ends_with('r')) {
        return em.trim().parse().ok();
    }
    css_length_px(value).map(|px| px / font_px)
}

/// Restrictive inline declarations on an element holding `text_len` characters
pub fn spacing_issues(style: &str, text_len: usize) -> Vec<SpacingIssue> {
    let declarations = style_declarations(style);
    let font_px = declarations
        .iter()
        .rev()
        .find(|(p, _)| p == "font-size")
        .and_then(|(_, v)| css_length_px(v))
        .filter(|px| *px > 0.0)
        .unwrap_or(BASE_FONT_PX);

    let mut issues = Vec::new();
    let mut push = |property: &str, value: &str, issue: String| {
        issues.push(SpacingIssue {
            property: property.to_string(),
            value: value.to_string(),
            issue,
        })
    };

    for (property, value) in &declarations {
        let (property, value) = (property.as_str(), value.as_str());
        let lower = value.to_lowercase();
        match property {
            "height" if fixed_below(&lower, MAX_FIXED_HEIGHT_PX) => push(
                property,
                value,
                "a fixed height can clip text when spacing is increased".to_string(),
            ),
            "max-height" if fixed_below(&lower, MAX_RESTRICTIVE_MAX_HEIGHT_PX) => push(
                property,
                value,
                "a small max-height limits room for increased spacing".to_string(),
            ),
            "overflow" | "overflow-y" if lower == "hidden" && text_len > 50 => push(
                property,
                value,
                "overflow: hidden can hide text when spacing is increased".to_string(),
            ),
            "white-space" if lower == "nowrap" && text_len > 30 => push(
                property,
                value,
                "nowrap prevents lines from wrapping with wider spacing".to_string(),
            ),
            "line-height" if lower != "normal" && text_len > 20 => {
                if let Some(ratio) = line_height_ratio(&lower, font_px).filter(|r| *r > 0.0 && *r < MIN_LINE_HEIGHT_RATIO) {
                    push(
                        property,
                        value,
                        format!("line-height ratio {:.2} is tight; use at least 1.5", ratio),
                    );
                }
            }
            "width" if fixed_below(&lower, MAX_NARROW_WIDTH_PX) && text_len > 30 => push(
                property,
                value,
                "a narrow fixed width can overflow with wider word spacing".to_string(),
            ),
            _ => {}
        }
    }
    issues
}

fn element_issues(element: &ElementRef<'_>) -> Vec<SpacingIssue> {
    let Some(style) = element.value().attr("style") else {
        return Vec::new();
    };
    let text_len = text_of(element).chars().count();
    if text_len == 0 {
        return Vec::new();
    }
    spacing_issues(style, text_len)
}

#[async_trait(?Send)]
impl Check for TextSpacingRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let nodes = document
            .select(TEXT_ELEMENTS)?
            .iter()
            .filter_map(|element| {
                let issues = element_issues(element);
                if issues.is_empty() {
                    return None;
                }
                let listed: Vec<String> = issues.iter().map(ToString::to_string).collect();
                Some(RawNode::for_element(
                    utils,
                    element,
                    format!(
                        "Inline styles may block text spacing adjustments: {}. Prefer min-height over height, overflow: visible/auto, wrapping text and line-height of at least 1.5.",
                        listed.join("; ")
                    ),
                ))
            })
            .take(MAX_NODES)
            .collect();
        Ok(RawResult::from_nodes(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "This sentence is comfortably longer than fifty characters in total.";

    fn properties(style: &str, text_len: usize) -> Vec<String> {
        spacing_issues(style, text_len).into_iter().map(|i| i.property).collect()
    }

    #[test]
    fn test_restrictive_declarations() {
        let style = "height: 40px; max-height: 100px; overflow: hidden; white-space: nowrap; line-height: 1; width: 120px";
        assert_eq!(
            properties(style, 80),
            vec!["height", "max-height", "overflow", "white-space", "line-height", "width"]
        );
    }

    #[test]
    fn test_relaxed_declarations_pass() {
        let style = "height: auto; max-height: 50%; overflow: auto; line-height: 1.5; width: 600px; min-height: 40px";
        assert!(properties(style, 80).is_empty());
    }

    #[test]
    fn test_text_length_thresholds() {
        let style = "overflow: hidden; white-space: nowrap; width: 100px; line-height: 1";
        assert!(properties(style, 10).is_empty());
        assert_eq!(properties(style, 40), vec!["white-space", "width", "line-height"]);
    }

    #[test]
    fn test_line_height_units() {
        assert_eq!(line_height_ratio("18px", 16.0), Some(1.125));
        assert_eq!(line_height_ratio("150%", 16.0), Some(1.5));
        assert_eq!(line_height_ratio("1.1em", 16.0), Some(1.1));
        assert_eq!(line_height_ratio("2rem", 16.0), Some(2.0));
        assert!(properties("font-size: 20px; line-height: 22px", 40).contains(&"line-height".to_string()));
        assert!(properties("font-size: 12px; line-height: 18px", 40).is_empty());
    }

    #[tokio::test]
    async fn test_check_reports_text_elements_only() {
        let html = format!(
            r#"<p id="clip" style="height: 20px; overflow: hidden">{long}</p>
               <div style="height: 20px"></div>
               <p style="color: #000">{long}</p>"#,
            long = LONG
        );
        let result = TextSpacingRule
            .check(&Document::parse(&html), &NodeUtils::new())
            .await
            .unwrap();
        let nodes = result.nodes.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].selector.as_deref(), Some("#clip"));
        assert!(nodes[0].help.as_deref().unwrap().contains("height: 20px"));
    }

    #[tokio::test]
    async fn test_node_cap() {
        let html = format!(r#"<p style="height: 10px">{}</p>"#, LONG).repeat(30);
        let result = TextSpacingRule
            .check(&Document::parse(&html), &NodeUtils::new())
            .await
            .unwrap();
        assert_eq!(result.node_count(), MAX_NODES);
    }
}
