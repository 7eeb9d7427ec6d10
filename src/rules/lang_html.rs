// SPDX-License-Identifier: PMPL-1.0-or-later
//! Language of page rule - WCAG 3.1.1 Language of Page (Level A)
//!
//! `<html>` must carry a `lang` attribute shaped like a language tag
//! (`xx`, `xxx`, `xx-YY`).

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

pub const RULE_ID: &str = "lang-html";

pub struct LangHtmlRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("3.1.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("The <html> element must have a valid lang attribute identifying the page language")
        .with_check(LangHtmlRule)
}

fn lang_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^[a-z]{2,3}(-[a-z]{2,3})?$").expect("valid regex"))
}

/// Whether a lang value looks like a primary language subtag with optional region
pub fn is_valid_lang_code(lang: &str) -> bool {
    lang_regex().is_match(lang.trim())
}

#[async_trait(?Send)]
impl Check for LangHtmlRule {
    async fn check(&self, document: &Document, _utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let root = document.root();
        let node = RawNode::new().with_selector("html");

        let node = match root.value().attr("lang") {
            None => {
                let snippet = match root.value().attr("class") {
                    Some(class) => format!("<html class=\"{}\">", class),
                    None => "<html>".to_string(),
                };
                node.with_snippet(snippet).with_help(
                    "Add a lang attribute to the <html> element, for example <html lang=\"en\">.",
                )
            }
            Some(lang) if lang.trim().is_empty() => node
                .with_snippet("<html lang=\"\">")
                .with_help("The lang attribute is empty. Set a valid language code such as lang=\"en\" or lang=\"pt-BR\"."),
            Some(lang) if !is_valid_lang_code(lang) => node
                .with_snippet(format!("<html lang=\"{}\">", lang))
                .with_help(format!(
                    "The language code \"{}\" does not look valid. Use an ISO 639-1 code such as \"en\", \"es\" or \"pt-BR\".",
                    lang
                )),
            Some(_) => return Ok(RawResult::pass()),
        };

        Ok(RawResult::from_nodes(vec![node]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(html: &str) -> usize {
        LangHtmlRule
            .check(&Document::parse(html), &NodeUtils::new())
            .await
            .unwrap()
            .node_count()
    }

    #[test]
    fn test_lang_codes() {
        assert!(is_valid_lang_code("en"));
        assert!(is_valid_lang_code("pt-BR"));
        assert!(is_valid_lang_code(" fil "));
        assert!(!is_valid_lang_code("english"));
        assert!(!is_valid_lang_code("e"));
        assert!(!is_valid_lang_code("en_US"));
    }

    #[tokio::test]
    async fn test_lang_attribute_states() {
        assert_eq!(count(r#"<html lang="en"><body></body></html>"#).await, 0);
        assert_eq!(count("<html><body></body></html>").await, 1);
        assert_eq!(count(r#"<html lang=""><body></body></html>"#).await, 1);
        assert_eq!(count(r#"<html lang="xx_yy_zz"><body></body></html>"#).await, 1);
    }
}
