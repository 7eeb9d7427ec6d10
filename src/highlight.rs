// SPDX-License-Identifier: PMPL-1.0-or-later
//! Visual marking of flagged elements.
//!
//! A highlight request replaces whatever was marked before. An empty request
//! only clears. Selectors that fail to parse or match nothing are skipped.

use crate::dom::{parse_selector, Document};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Label shown on a mark whose request carried no rule id
pub const UNKNOWN_RULE: &str = "unknown";

/// One element to mark, as sent by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightNode {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl HighlightNode {
    pub fn new(selector: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            rule_id: Some(rule_id.into()),
        }
    }
}

/// A marked element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mark {
    pub selector: String,
    /// Rule label attached to the element
    pub rule_id: String,
    /// Outer HTML of the first matching element
    pub snippet: String,
}

/// The set of currently marked elements for one document
#[derive(Debug, Default)]
pub struct Highlighter {
    marks: Vec<Mark>,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current marks; returns how many elements are now marked
    pub fn apply(&mut self, document: &Document, nodes: &[HighlightNode]) -> usize {
        self.marks.clear();
        if nodes.is_empty() {
            debug!("Highlights cleared");
            return 0;
        }

        for node in nodes {
            let selector = match parse_selector(&node.selector) {
                Ok(selector) => selector,
                Err(e) => {
                    warn!(selector = %node.selector, error = %e, "Could not highlight node");
                    continue;
                }
            };
            let Some(element) = document.html().select(&selector).next() else {
                debug!(selector = %node.selector, "No element matches highlight selector");
                continue;
            };

            let rule_id = node.rule_id.clone().unwrap_or_else(|| UNKNOWN_RULE.to_string());
            // The same selector marks the same element; the latest label wins
            match self.marks.iter_mut().find(|m| m.selector == node.selector) {
                Some(mark) => mark.rule_id = rule_id,
                None => self.marks.push(Mark {
                    selector: node.selector.clone(),
                    rule_id,
                    snippet: element.html(),
                }),
            }
        }

        debug!(count = self.marks.len(), "Elements highlighted");
        self.marks.len()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// The element scrolled into view after highlighting
    pub fn first(&self) -> Option<&Mark> {
        self.marks.first()
    }

    pub fn is_active(&self) -> bool {
        !self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Document {
        Document::parse(r#"<body><img id="logo" src="l.png"><a class="more" href="/x">x</a></body>"#)
    }

    #[test]
    fn test_apply_marks_matching_elements() {
        let doc = page();
        let mut highlighter = Highlighter::new();
        let count = highlighter.apply(
            &doc,
            &[HighlightNode::new("#logo", "img-alt"), HighlightNode::new("a.more", "link-name")],
        );
        assert_eq!(count, 2);
        assert_eq!(highlighter.first().unwrap().rule_id, "img-alt");
        assert!(highlighter.first().unwrap().snippet.starts_with("<img"));
    }

    #[test]
    fn test_invalid_and_unmatched_selectors_are_skipped() {
        let doc = page();
        let mut highlighter = Highlighter::new();
        let nodes = vec![
            HighlightNode::new("N/A", "x"),
            HighlightNode::new("#missing", "x"),
            HighlightNode { selector: "#logo".into(), rule_id: None },
        ];
        assert_eq!(highlighter.apply(&doc, &nodes), 1);
        assert_eq!(highlighter.marks()[0].rule_id, UNKNOWN_RULE);
    }

    #[test]
    fn test_empty_request_clears() {
        let doc = page();
        let mut highlighter = Highlighter::new();
        highlighter.apply(&doc, &[HighlightNode::new("#logo", "img-alt")]);
        assert!(highlighter.is_active());
        assert_eq!(highlighter.apply(&doc, &[]), 0);
        assert!(!highlighter.is_active());
    }

    #[test]
    fn test_repeated_selector_keeps_latest_label() {
        let doc = page();
        let mut highlighter = Highlighter::new();
        highlighter.apply(
            &doc,
            &[HighlightNode::new("#logo", "img-alt"), HighlightNode::new("#logo", "color-contrast")],
        );
        assert_eq!(highlighter.marks().len(), 1);
        assert_eq!(highlighter.marks()[0].rule_id, "color-contrast");
    }

    #[test]
    fn test_wire_format() {
        let node: HighlightNode = serde_json::from_str(r##"{"selector": "#a", "ruleId": "img-alt"}"##).unwrap();
        assert_eq!(node, HighlightNode::new("#a", "img-alt"));
    }
}
