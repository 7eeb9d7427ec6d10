// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text rule - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Flags `<img>` elements whose alternative text is:
//! - missing entirely
//! - empty without marking the image as decorative
//! - excessively long
//! - generic ("image", "photo") or just the file name

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "img-alt";

/// Alt text longer than this should move to a long description
const MAX_ALT_LEN: usize = 150;

/// Images at most this many pixels in both dimensions are treated as spacers/icons
const DECORATIVE_MAX_PX: u32 = 10;

/// Generic alt text values that indicate lazy/unhelpful descriptions
const GENERIC_ALT_VALUES: &[&str] = &[
    "image", "imagem", "photo", "foto", "picture", "img", "icon", "ícone", "logo", "banner",
    "graphic",
];

pub struct ImgAltRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.1.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("Images must have appropriate alternative text (alt attribute)")
        .with_check(ImgAltRule)
}

fn dimension(img: &ElementRef<'_>, attr: &str) -> Option<u32> {
    img.value()
        .attr(attr)
        .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
}

/// Explicit presentation role, or a tiny declared size
fn is_probably_decorative(img: &ElementRef<'_>) -> bool {
    if matches!(img.value().attr("role"), Some("presentation") | Some("none")) {
        return true;
    }
    matches!(
        (dimension(img, "width"), dimension(img, "height")),
        (Some(w), Some(h)) if w <= DECORATIVE_MAX_PX && h <= DECORATIVE_MAX_PX
    )
}

fn alt_problem(img: &ElementRef<'_>) -> Option<String> {
    let Some(alt) = img.value().attr("alt") else {
        return Some(
            "Add an alt attribute to this image. Describe informative images; use alt=\"\" with role=\"presentation\" for decorative ones."
                .to_string(),
        );
    };

    if alt.trim().is_empty() {
        if is_probably_decorative(img) {
            return None;
        }
        return Some(
            "This image has an empty alt. If it is decorative add role=\"presentation\"; otherwise describe it in the alt."
                .to_string(),
        );
    }

    let length = alt.chars().count();
    if length > MAX_ALT_LEN {
        return Some(format!(
            "The alternative text is {} characters long. Summarize it (about {} characters at most) and link to a longer description.",
            length, MAX_ALT_LEN
        ));
    }

    let alt_lower = alt.trim().to_lowercase();
    let file_name = img
        .value()
        .attr("src")
        .and_then(|src| src.rsplit('/').next())
        .map(str::to_lowercase);

    if GENERIC_ALT_VALUES.contains(&alt_lower.as_str()) || file_name.as_deref() == Some(alt_lower.as_str()) {
        return Some(format!(
            "The alternative text \"{}\" is too generic. Describe the content or function of the image.",
            alt
        ));
    }

    None
}

#[async_trait(?Send)]
impl Check for ImgAltRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let nodes = document
            .select("img")?
            .iter()
            .filter_map(|img| alt_problem(img).map(|help| RawNode::for_element(utils, img, help)))
            .collect();
        Ok(RawResult::from_nodes(nodes))
    }
}
