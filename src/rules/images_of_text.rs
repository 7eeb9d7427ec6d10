// SPDX-License-Identifier: PMPL-1.0-or-later
//! Images of text rule - WCAG 1.4.5 Images of Text (Level AA)
//!
//! Heuristic: flags images whose file name or alt text suggests they render
//! text that could be real HTML. Logos, photos and diagrams are exempt, as
//! are small images. Findings are warnings.

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use regex::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

pub const RULE_ID: &str = "images-of-text";

/// Images no larger than this in both declared dimensions are treated as icons
const SMALL_IMAGE_PX: u32 = 50;

/// Alt text longer than this reads as prose that belongs in the page
const PROSE_ALT_CHARS: usize = 100;

const TEXT_FILENAME_HINTS: &[&str] = &[
    "text", "texto", "title", "titulo", "heading", "cabecalho", "button", "botao", "label", "rotulo",
    "caption", "legenda", "quote", "citacao", "message", "mensagem", "slogan", "banner-text",
    "text-banner", "heading-", "title-",
];

const LOGO_HINTS: &[&str] = &["logo", "brand", "marca", "logotipo"];

const PHOTO_HINTS: &[&str] = &[
    "screenshot", "captura", "photo", "foto", "image", "picture", "figura", "diagram", "diagrama",
    "chart", "grafico", "graph", "ilustra", "illustr",
];

fn formattable_alt_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(bem.vindo|welcome|título|title|heading|clique|click|leia|read|saiba mais|learn more|descubra|discover)|(novo|new|promoção|sale|oferta|offer)$",
        )
        .expect("valid regex")
    })
}

pub struct ImagesOfTextRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.4.5", WcagLevel::AA)
        .with_severity(Severity::Warn)
        .with_description("Avoid images of text; prefer real HTML/CSS text where possible")
        .with_check(ImagesOfTextRule)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|needle| haystack.contains(needle))
}

fn dimension(img: &ElementRef<'_>, attr: &str) -> Option<u32> {
    img.value()
        .attr(attr)
        .and_then(|v| v.trim().trim_end_matches("px").parse().ok())
}

fn is_small(img: &ElementRef<'_>) -> bool {
    matches!(
        (dimension(img, "width"), dimension(img, "height")),
        (Some(w), Some(h)) if w <= SMALL_IMAGE_PX && h <= SMALL_IMAGE_PX
    )
}

fn alt_suggests_text(alt: &str) -> bool {
    let length = alt.chars().count();
    if length < 5 {
        return false;
    }
    length > PROSE_ALT_CHARS || formattable_alt_regex().is_match(alt)
}

fn text_image_problem(img: &ElementRef<'_>) -> Option<String> {
    let value = img.value();
    let alt = value.attr("alt").unwrap_or_default();
    let src = value.attr("src").unwrap_or_default();

    if alt.is_empty() && matches!(value.attr("role"), Some("presentation") | Some("none")) {
        return None;
    }
    if is_small(img) {
        return None;
    }

    let identity = format!(
        "{}{}{}{}",
        src,
        value.attr("class").unwrap_or_default(),
        value.id().unwrap_or_default(),
        alt
    );
    if contains_any(&identity, LOGO_HINTS) || contains_any(&format!("{}{}", src, alt), PHOTO_HINTS) {
        return None;
    }

    if contains_any(src, TEXT_FILENAME_HINTS) {
        let file_name = src.rsplit('/').next().unwrap_or(src);
        return Some(format!(
            "The file name \"{}\" suggests an image of text. Use real HTML/CSS text, which can be resized, translated and restyled. Keep images only where essential (logos, signatures).",
            file_name
        ));
    }

    if alt_suggests_text(alt) {
        let shown: String = alt.chars().take(80).collect();
        let ellipsis = if alt.chars().count() > 80 { "..." } else { "" };
        return Some(format!(
            "The alt text \"{}{}\" suggests this image contains formattable text. Use HTML elements styled with CSS instead. Logos, screenshots and text in photos are valid exceptions.",
            shown, ellipsis
        ));
    }

    if src.to_lowercase().contains(".svg") {
        let words = alt.split_whitespace().count();
        if words > 5 && words < 20 {
            return Some(
                "This SVG may contain text that could be HTML/CSS. Check whether its text can be styled markup instead."
                    .to_string(),
            );
        }
    }

    None
}

#[async_trait(?Send)]
impl Check for ImagesOfTextRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let nodes = document
            .select("img")?
            .iter()
            .filter_map(|img| text_image_problem(img).map(|help| RawNode::for_element(utils, img, help)))
            .collect();
        Ok(RawResult::from_nodes(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn selectors(html: &str) -> Vec<String> {
        ImagesOfTextRule
            .check(&Document::parse(html), &NodeUtils::new())
            .await
            .unwrap()
            .nodes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|n| n.selector)
            .collect()
    }

    #[tokio::test]
    async fn test_text_file_names_are_flagged() {
        let html = r#"<img id="t" src="/img/section-title.png" alt="Our services"><img src="/img/river.jpg" alt="A river at dawn">"#;
        assert_eq!(selectors(html).await, vec!["#t"]);
    }

    #[tokio::test]
    async fn test_exemptions() {
        let html = r#"
            <img src="/brand/title-logo.png" alt="Acme">
            <img src="/shots/heading-screenshot.png" alt="Settings page">
            <img src="button-ok.png" alt="OK" width="24" height="24">
            <img src="quote.png" alt="" role="presentation">
        "#;
        assert!(selectors(html).await.is_empty());
    }

    #[tokio::test]
    async fn test_alt_that_reads_like_markup() {
        let html = r#"
            <img id="welcome" src="hero.png" alt="Welcome to our store">
            <img id="sale" src="promo.png" alt="Winter sale">
            <img src="team.png" alt="Four engineers at a whiteboard">
        "#;
        assert_eq!(selectors(html).await, vec!["#welcome", "#sale"]);
    }

    #[tokio::test]
    async fn test_wordy_svg() {
        let html = r#"<img id="svg" src="steps.svg" alt="Sign up, verify your email, then start building"><img src="dot.svg" alt="Status dot">"#;
        assert_eq!(selectors(html).await, vec!["#svg"]);
    }
}
