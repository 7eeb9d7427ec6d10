// SPDX-License-Identifier: PMPL-1.0-or-later
//! Icon labels rule - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Links and buttons whose only content is an icon (icon font, SVG, icon
//! image) need an accessible label that states their function.

use crate::dom::{select_within, text_of, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "icon-labels";

/// Icon markup recognized inside an interactive element
const ICON_CONTENT: &str = r#"i[class*="fa"], i[class*="icon"], i[class*="material"], span[class*="icon"], span[class*="fa"], span[class*="material"], svg, img[class*="icon"], [class*="glyphicon"], [class*="octicon"]"#;

/// Class fragments that mark the element itself as an icon
const ICON_CLASS_PATTERNS: &[&str] = &["icon", "fa-", "material-", "glyphicon", "octicon"];

/// Labels this short (in characters) are flagged as too terse
const TERSE_LABEL_CHARS: usize = 3;

pub struct IconLabelsRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.1.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("Icons in links and buttons must have a visible text label or an aria-label")
        .with_check(IconLabelsRule)
}

fn contains_only_icon(element: &ElementRef<'_>) -> anyhow::Result<bool> {
    if !text_of(element).is_empty() {
        return Ok(false);
    }
    if !select_within(element, ICON_CONTENT)?.is_empty() {
        return Ok(true);
    }
    let class = element.value().attr("class").unwrap_or_default();
    Ok(ICON_CLASS_PATTERNS.iter().any(|pattern| class.contains(pattern)))
}

fn icon_kind(element: &ElementRef<'_>) -> anyhow::Result<&'static str> {
    let kind = if !select_within(element, r#"i[class*="fa"]"#)?.is_empty() {
        "Font Awesome icon"
    } else if !select_within(element, r#"[class*="material"]"#)?.is_empty() {
        "Material icon"
    } else if !select_within(element, "svg")?.is_empty() {
        "SVG"
    } else if !select_within(element, "img")?.is_empty() {
        "icon image"
    } else {
        "icon"
    };
    Ok(kind)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Label sources in order: aria-labelledby, aria-label, title, SVG `<title>`, image alt
fn icon_label(document: &Document, element: &ElementRef<'_>) -> anyhow::Result<String> {
    if let Some(label) = element
        .value()
        .attr("aria-labelledby")
        .and_then(|id| document.element_by_id(id.trim()))
    {
        return Ok(text_of(&label));
    }

    let value = element.value();
    if let Some(label) = non_empty(value.attr("aria-label")).or_else(|| non_empty(value.attr("title"))) {
        return Ok(label);
    }

    if let Some(title) = select_within(element, "svg title")?.first() {
        let title = text_of(title);
        if !title.is_empty() {
            return Ok(title);
        }
    }

    if let Some(img) = select_within(element, "img")?.first() {
        if let Some(alt) = non_empty(img.value().attr("alt")) {
            return Ok(alt);
        }
    }

    Ok(String::new())
}

#[async_trait(?Send)]
impl Check for IconLabelsRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        for element in document.select(r#"a[href], button, [role="button"]"#)? {
            if !contains_only_icon(&element)? {
                continue;
            }

            let label = icon_label(document, &element)?;
            let length = label.chars().count();
            if length < 2 {
                let tag = element.value().name().to_lowercase();
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "This {} contains only a {} with no visible text or accessible label. Add visible text, an aria-label, aria-labelledby, an SVG <title> or alt text on the image.",
                        tag,
                        icon_kind(&element)?
                    ),
                ));
            } else if length <= TERSE_LABEL_CHARS {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "The label \"{}\" is too short to describe the function. Use e.g. \"Close dialog\" instead of \"X\".",
                        label
                    ),
                ));
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
