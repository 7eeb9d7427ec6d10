// SPDX-License-Identifier: PMPL-1.0-or-later
//! Long description rule - WCAG 1.1.1 Non-text Content (Level A)
//!
//! When an image has a long description (`aria-describedby`, `longdesc`,
//! `aria-details` or a detailed `<figcaption>`), its short alt text should say
//! where to find it. Conversely, alt text that promises a description the
//! page does not provide is flagged too.

use crate::dom::{select_within, text_of, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "alt-indicates-longdesc";

/// Referenced text must be longer than this to count as a long description
const LONG_DESCRIPTION_CHARS: usize = 100;

/// Phrases in alt text that point the reader to a longer description
const POINTER_PHRASES: &[&str] = &[
    "descrição", "descricao", "description", "detalhes", "details", "detailed", "abaixo", "below",
    "após", "after", "seguir", "following", "próxim", "next", "ver ", "see ", "veja ", "consulte",
    "texto completo", "full text", "complete", "explicação", "explanation", "dados completos",
    "informações adicionais", "additional information",
];

/// Where an image's long description lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum LongDescription {
    DescribedBy(String),
    LongDesc,
    Details,
    Figcaption,
}

impl LongDescription {
    fn location(&self) -> String {
        match self {
            LongDescription::DescribedBy(id) => format!("linked by aria-describedby=\"{}\"", id),
            LongDescription::LongDesc => "linked by the longdesc attribute".to_string(),
            LongDescription::Details => "linked by aria-details".to_string(),
            LongDescription::Figcaption => "in the adjacent <figcaption>".to_string(),
        }
    }
}

pub struct AltIndicatesLongdescRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("1.1.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("Short alt text must say where the long description is when one exists")
        .with_check(AltIndicatesLongdescRule)
}

fn is_long_text(element: &ElementRef<'_>) -> bool {
    text_of(element).chars().count() > LONG_DESCRIPTION_CHARS
}

fn references_long_text(document: &Document, img: &ElementRef<'_>, attr: &str) -> Option<String> {
    let id = img.value().attr(attr)?.trim();
    document
        .element_by_id(id)
        .filter(is_long_text)
        .map(|_| id.to_string())
}

fn long_description(document: &Document, img: &ElementRef<'_>) -> anyhow::Result<Option<LongDescription>> {
    if let Some(id) = references_long_text(document, img, "aria-describedby") {
        return Ok(Some(LongDescription::DescribedBy(id)));
    }
    if img.value().attr("longdesc").is_some_and(|l| !l.trim().is_empty()) {
        return Ok(Some(LongDescription::LongDesc));
    }
    if references_long_text(document, img, "aria-details").is_some() {
        return Ok(Some(LongDescription::Details));
    }

    let figure = img
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|p| p.value().name() == "figure");
    if let Some(figure) = figure {
        if select_within(&figure, "figcaption")?.first().is_some_and(is_long_text) {
            return Ok(Some(LongDescription::Figcaption));
        }
    }
    Ok(None)
}

fn points_to_description(alt: &str) -> bool {
    let alt = alt.to_lowercase();
    POINTER_PHRASES.iter().any(|phrase| alt.contains(phrase))
}

#[async_trait(?Send)]
impl Check for AltIndicatesLongdescRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        for img in document.select("img")? {
            let alt = img.value().attr("alt").unwrap_or_default();
            let decorative = matches!(img.value().attr("role"), Some("presentation") | Some("none"));
            if alt.is_empty() && decorative {
                continue;
            }

            match long_description(document, &img)? {
                Some(description) if !points_to_description(alt) => {
                    nodes.push(RawNode::for_element(
                        utils,
                        &img,
                        format!(
                            "This image has a long description {}, but the alt text does not mention it. Current alt: \"{}\". End the alt with a pointer such as \"(detailed description below)\".",
                            description.location(),
                            alt
                        ),
                    ));
                }
                None if points_to_description(alt) => {
                    nodes.push(RawNode::for_element(
                        utils,
                        &img,
                        format!(
                            "The alt text mentions a further description (\"{}\") but none was found. Link one with aria-describedby, a detailed <figcaption> or a description page, or remove the mention.",
                            alt
                        ),
                    ));
                }
                _ => {}
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
