// SPDX-License-Identifier: PMPL-1.0-or-later
//! Conversion of raw rule output into the canonical violation schema.

use crate::dom::truncate_chars;
use crate::engine::RuleDefinition;
use crate::rules::{RawNode, RawResult};
use crate::wcag::{Severity, WcagRef};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Selector recorded when a rule did not supply one
pub const MISSING_SELECTOR: &str = "N/A";

/// Snippets are cut to this many characters
pub const SNIPPET_MAX_LEN: usize = 200;

/// Remediation text used when a rule did not supply one
pub const DEFAULT_HELP: &str = "Fix this element according to the WCAG guidelines";

/// One offending element in a normalized violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationNode {
    pub selector: String,
    pub snippet: String,
    pub help: String,
}

impl ViolationNode {
    fn from_raw(rule_id: &str, raw: RawNode) -> Self {
        if raw.selector.is_none() {
            warn!(rule = %rule_id, "Rule reported a node without a CSS selector");
        }
        Self {
            selector: raw.selector.unwrap_or_else(|| MISSING_SELECTOR.to_string()),
            snippet: truncate_chars(raw.snippet.as_deref().unwrap_or_default(), SNIPPET_MAX_LEN),
            help: raw.help.unwrap_or_else(|| DEFAULT_HELP.to_string()),
        }
    }
}

/// The engine's output unit: one per rule that flagged at least one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedViolation {
    pub rule_id: String,
    pub wcag: WcagRef,
    pub severity: Severity,
    pub description: String,
    pub nodes: Vec<ViolationNode>,
}

impl NormalizedViolation {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Normalize a rule's raw result.
///
/// Returns `None` when the rule flagged nothing, or when it broke the
/// contract by returning no node sequence (logged as a rule-authoring error).
pub fn normalize_result(
    rule_id: &str,
    rule: &RuleDefinition,
    raw: RawResult,
) -> Option<NormalizedViolation> {
    let Some(nodes) = raw.nodes else {
        warn!(rule = %rule_id, "Rule returned a result without a 'nodes' sequence");
        return None;
    };
    if nodes.is_empty() {
        return None;
    }

    Some(NormalizedViolation {
        rule_id: rule_id.to_string(),
        wcag: rule.wcag().clone(),
        severity: rule.severity(),
        description: rule.description().to_string(),
        nodes: nodes
            .into_iter()
            .map(|node| ViolationNode::from_raw(rule_id, node))
            .collect(),
    })
}
