// SPDX-License-Identifier: PMPL-1.0-or-later
//! Links vs buttons rule - WCAG 4.1.2 Name, Role, Value (Level A)
//!
//! `<a href>` navigates, `<button>` acts. Flags:
//! - `<a>` without `href` that carries a click handler or text
//! - links with a placeholder `href` (`#`, `javascript:`) that perform an action
//! - `<button href>`
//! - button-styled links with a placeholder `href`
//! - links that open a modal dialog

use crate::dom::{text_of, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "links-vs-buttons";

/// Inline and framework click-handler attributes
const CLICK_ATTRS: &[&str] = &["onclick", "ng-click", "@click", "v-on:click"];

/// Words in link text that announce an action rather than a destination
const ACTION_WORDS: &[&str] = &[
    "abrir", "fechar", "mostrar", "ocultar", "exibir", "esconder", "enviar", "salvar", "deletar",
    "remover", "adicionar", "editar", "cancelar", "confirmar", "aceitar", "recusar", "voltar",
    "open", "close", "show", "hide", "submit", "save", "delete", "remove", "add", "edit", "cancel",
    "ok", "yes", "no",
];

const PLACEHOLDER_HREFS: &str =
    r##"a[href="#"], a[href="javascript:void(0)"], a[href="javascript:"], a[href="#!"]"##;

const MODAL_OPENERS: &str = r#"a[data-toggle="modal"], a[data-bs-toggle="modal"], a[data-target*="modal"], a[href*="modal"], a[aria-haspopup="dialog"]"#;

pub struct LinksVsButtonsRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("4.1.2", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("Links (<a>) must navigate and buttons (<button>) must perform actions")
        .with_check(LinksVsButtonsRule)
}

fn has_click_handler(element: &ElementRef<'_>) -> bool {
    CLICK_ATTRS.iter().any(|attr| element.value().attr(attr).is_some())
}

/// `#` or a `javascript:` URL
fn is_placeholder_href(href: &str) -> bool {
    href == "#" || href.starts_with("javascript:")
}

#[async_trait(?Send)]
impl Check for LinksVsButtonsRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        for link in document.select("a:not([href])")? {
            if link.value().attr("role") == Some("button") {
                continue;
            }
            if has_click_handler(&link) || !text_of(&link).is_empty() {
                nodes.push(RawNode::for_element(
                    utils,
                    &link,
                    "This <a> has no href, so it performs an action instead of navigating. Use <button type=\"button\"> for actions, or add role=\"button\" with Enter/Space keyboard support.",
                ));
            }
        }

        for link in document.select(PLACEHOLDER_HREFS)? {
            let href = link.value().attr("href").unwrap_or_default();
            // Named anchors are real link targets
            if href == "#" && link.value().attr("name").is_some() {
                continue;
            }
            let text = text_of(&link).to_lowercase();
            let looks_like_action = ACTION_WORDS.iter().any(|word| text.contains(word));
            if looks_like_action || link.value().attr("onclick").is_some() {
                nodes.push(RawNode::for_element(
                    utils,
                    &link,
                    format!(
                        "This link uses href=\"{}\" but appears to perform an action (\"{}\"). Use <button type=\"button\"> for actions and keep <a> for real navigation.",
                        href, text
                    ),
                ));
            }
        }

        for button in document.select("button[href]")? {
            nodes.push(RawNode::for_element(
                utils,
                &button,
                "<button> does not support href. Use <a href=\"...\"> to navigate to another page.",
            ));
        }

        for link in document.select(r#"a[href][class*="btn"], a[href][class*="button"]"#)? {
            if is_placeholder_href(link.value().attr("href").unwrap_or_default()) {
                nodes.push(RawNode::for_element(
                    utils,
                    &link,
                    "This link is styled as a button (\"btn\"/\"button\" class) but has a placeholder href. Use <button> for actions and <a> only for real navigation.",
                ));
            }
        }

        for link in document.select(MODAL_OPENERS)? {
            let opens_in_place = link.value().attr("href").map_or(true, |href| href.is_empty() || is_placeholder_href(href));
            if opens_in_place {
                nodes.push(RawNode::for_element(
                    utils,
                    &link,
                    "This link opens a modal dialog, which is an action. Use <button> with aria-haspopup=\"dialog\" and aria-expanded instead of <a>.",
                ));
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn selectors(html: &str) -> Vec<String> {
        LinksVsButtonsRule
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
    async fn test_proper_links_and_buttons_pass() {
        let html = r##"
            <a href="/pricing">See pricing</a>
            <button type="button">Open the menu</button>
            <a name="top"></a>
            <a href="#" name="back">Back to top</a>
            <a class="toggle" role="button" onclick="go()">Toggle</a>
            <a class="btn-primary" href="/signup">Sign up</a>
        "##;
        assert!(selectors(html).await.is_empty());
    }

    #[tokio::test]
    async fn test_anchor_without_href() {
        let html = r#"<a id="act" onclick="doIt()"></a><a class="text">Read on</a><a name="empty"></a>"#;
        assert_eq!(selectors(html).await, vec!["#act", "a.text"]);
    }

    #[tokio::test]
    async fn test_placeholder_href_actions() {
        let html = r##"
            <a id="open" href="#">Open details</a>
            <a id="js" href="javascript:void(0)" onclick="x()">Toggle</a>
            <a id="plain" href="#!">Chapter</a>
        "##;
        assert_eq!(selectors(html).await, vec!["#open", "#js"]);
    }

    #[tokio::test]
    async fn test_button_with_href_and_button_styled_link() {
        let html = r##"<button id="nav" href="/home">Home</button><a id="fake" class="btn" href="javascript:go()">Go</a>"##;
        assert_eq!(selectors(html).await, vec!["#nav", "#fake"]);
    }

    #[tokio::test]
    async fn test_modal_openers() {
        let html = r##"
            <a id="m1" data-toggle="modal" href="#">Terms</a>
            <a id="m2" aria-haspopup="dialog">Terms</a>
            <a id="m3" href="/modal-help">Help page</a>
        "##;
        // m2 also has no href and carries text
        assert_eq!(selectors(html).await, vec!["#m2", "#m1", "#m2"]);
    }
}
