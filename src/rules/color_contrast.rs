// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast rules for inline styles
//!
//! - `color-contrast`: WCAG 1.4.3 Contrast (Minimum) (Level AA)
//! - `color-contrast-enhanced`: WCAG 1.4.6 Contrast (Enhanced) (Level AAA)
//!
//! Elements declaring both a text color and a background color in their
//! `style` attribute are checked with the contrast utility. Large text
//! (at least 24px/18pt, or 18.66px/14pt when bold) gets the relaxed threshold.

use crate::contrast::{contrast_ratio, parse_color, passes_aa, passes_aaa, Rgb};
use crate::dom::{css_length_px, style_declarations, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;

pub const RULE_ID: &str = "color-contrast";
pub const ENHANCED_RULE_ID: &str = "color-contrast-enhanced";

const LARGE_TEXT_PX: f64 = 24.0;
const LARGE_BOLD_TEXT_PX: f64 = 18.66;

/// Contrast check at either the minimum (AA) or enhanced (AAA) threshold
pub struct ColorContrastRule {
    enhanced: bool,
}

impl ColorContrastRule {
    pub fn minimum() -> Self {
        Self { enhanced: false }
    }

    pub fn enhanced() -> Self {
        Self { enhanced: true }
    }

    fn passes(&self, ratio: f64, large: bool) -> bool {
        if self.enhanced {
            passes_aaa(ratio, large)
        } else {
            passes_aa(ratio, large)
        }
    }

    fn required(&self, large: bool) -> f64 {
        match (self.enhanced, large) {
            (false, true) => 3.0,
            (false, false) | (true, true) => 4.5,
            (true, false) => 7.0,
        }
    }
}

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.4.3", WcagLevel::AA)
        .with_severity(Severity::Error)
        .with_description("Text must have a contrast ratio of at least 4.5:1 (3:1 for large text) against its background")
        .with_check(ColorContrastRule::minimum())
}

pub fn enhanced_spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.4.6", WcagLevel::AAA)
        .with_severity(Severity::Warn)
        .with_description("Text should have a contrast ratio of at least 7:1 (4.5:1 for large text) against its background")
        .with_check(ColorContrastRule::enhanced())
}

/// The colors and text size declared in one `style` attribute
#[derive(Debug, Default, PartialEq)]
struct InlineStyle {
    color: Option<Rgb>,
    background: Option<Rgb>,
    font_size_px: Option<f64>,
    bold: bool,
}

impl InlineStyle {
    fn parse(style: &str) -> Self {
        let mut parsed = InlineStyle::default();
        for (property, value) in style_declarations(style) {
            let value = value.as_str();
            match property.as_str() {
                "color" => parsed.color = parse_color(value),
                "background-color" | "background" => parsed.background = parse_color(value),
                "font-size" => parsed.font_size_px = css_length_px(value),
                "font-weight" => {
                    parsed.bold = value.eq_ignore_ascii_case("bold")
                        || value.eq_ignore_ascii_case("bolder")
                        || value.parse::<u16>().map(|w| w >= 700).unwrap_or(false)
                }
                _ => {}
            }
        }
        parsed
    }

    fn is_large_text(&self) -> bool {
        match self.font_size_px {
            Some(px) if px >= LARGE_TEXT_PX => true,
            Some(px) => self.bold && px >= LARGE_BOLD_TEXT_PX,
            None => false,
        }
    }
}

#[async_trait(?Send)]
impl Check for ColorContrastRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        for element in document.select("[style]")? {
            let style = InlineStyle::parse(element.value().attr("style").unwrap_or_default());
            let (Some(fg), Some(bg)) = (style.color, style.background) else {
                continue;
            };

            let large = style.is_large_text();
            let ratio = contrast_ratio(fg, bg);
            if !self.passes(ratio, large) {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "Contrast ratio {:.2}:1 is below the required {}:1. Darken the text or lighten the background.",
                        ratio,
                        self.required(large)
                    ),
                ));
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
