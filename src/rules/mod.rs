// SPDX-License-Identifier: PMPL-1.0-or-later
//! The rule contract and the built-in rule units.
//!
//! A rule is metadata plus an asynchronous check. Rules are independent
//! peers: none reads another's output, and each reports the nodes it flags
//! as a loosely shaped `RawResult` that the engine normalizes.
//!
//! ## Built-in rules
//!
//! - **page-title** (2.4.2, A): document has a descriptive `<title>`
//! - **lang-html** (3.1.1, A): `<html lang>` is present and well formed
//! - **img-alt** (1.1.1, A): images carry meaningful alternative text
//! - **heading-order** (1.3.1, A): heading levels are not skipped
//! - **link-name** (2.4.4, A): links have a descriptive accessible name
//! - **color-contrast** (1.4.3, AA): inline text/background contrast
//! - **color-contrast-enhanced** (1.4.6, AAA): enhanced inline contrast
//! - **multiple-ways** (2.4.5, AA): more than one way to locate pages
//! - **text-spacing** (1.4.12, AA): inline styles that clip spaced-out text
//! - **images-of-text** (1.4.5, AA): images that render formattable text
//! - **alt-indicates-longdesc** (1.1.1, A): alt text points to the long description
//! - **icon-labels** (1.1.1, A): icon-only links and buttons are labelled
//! - **semantic-landmarks** (1.3.1, A): one `<main>`, landmark elements used
//! - **links-vs-buttons** (4.1.2, A): links navigate, buttons act
//! - **keyboard-operable** (2.1.1, A): mouse behaviour has a keyboard path
//! - **focus-trap** (2.1.2, A): dialogs and menus can be left by keyboard

pub mod alt_indicates_longdesc;
pub mod color_contrast;
pub mod focus_trap;
pub mod heading_order;
pub mod icon_labels;
pub mod images_of_text;
pub mod img_alt;
pub mod keyboard_operable;
pub mod lang_html;
pub mod link_name;
pub mod links_vs_buttons;
pub mod multiple_ways;
pub mod page_title;
pub mod semantic_landmarks;
pub mod text_spacing;

use crate::dom::{Document, NodeUtils};
use crate::engine::AuditRunner;
use crate::error::Result;
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};

/// The asynchronous predicate at the heart of every rule.
///
/// Checks read the document and must not mutate it. Any error they return
/// is contained by the engine: the rule simply contributes nothing to the run.
#[async_trait(?Send)]
pub trait Check {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult>;
}

/// Adapter turning a plain function into a `Check`
pub struct FnCheck<F>(F);

#[async_trait(?Send)]
impl<F> Check for FnCheck<F>
where
    F: Fn(&Document, &NodeUtils) -> anyhow::Result<RawResult>,
{
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        (self.0)(document, utils)
    }
}

/// Wrap a synchronous function as a rule check
pub fn check_fn<F>(f: F) -> FnCheck<F>
where
    F: Fn(&Document, &NodeUtils) -> anyhow::Result<RawResult> + 'static,
{
    FnCheck(f)
}

/// One node flagged by a rule; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub selector: Option<String>,
    pub snippet: Option<String>,
    pub help: Option<String>,
}

impl RawNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe an element with the injected selector/snippet helpers
    pub fn for_element(utils: &NodeUtils, element: &ElementRef<'_>, help: impl Into<String>) -> Self {
        Self {
            selector: Some(utils.selector_for(element)),
            snippet: Some(utils.snippet_for(element)),
            help: Some(help.into()),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// A rule's own output.
///
/// `nodes: None` means the rule broke the contract and returned no node
/// sequence at all; the engine logs and drops such results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub nodes: Option<Vec<RawNode>>,
}

impl RawResult {
    /// No offending nodes
    pub fn pass() -> Self {
        Self { nodes: Some(Vec::new()) }
    }

    pub fn from_nodes(nodes: Vec<RawNode>) -> Self {
        Self { nodes: Some(nodes) }
    }

    /// Number of flagged nodes (zero when malformed)
    pub fn node_count(&self) -> usize {
        self.nodes.as_ref().map_or(0, Vec::len)
    }
}

/// Registration record for a rule; unset fields take the documented defaults
/// when the engine registers it.
#[derive(Default)]
pub struct RuleSpec {
    pub wcag_id: Option<String>,
    pub level: Option<WcagLevel>,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub check: Option<Box<dyn Check>>,
}

impl RuleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the WCAG criterion and level
    pub fn with_wcag(mut self, criterion: &str, level: WcagLevel) -> Self {
        self.wcag_id = Some(criterion.to_string());
        self.level = Some(level);
        self
    }

    pub fn with_level(mut self, level: WcagLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.check = Some(Box::new(check));
        self
    }
}

impl std::fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSpec")
            .field("wcag_id", &self.wcag_id)
            .field("level", &self.level)
            .field("severity", &self.severity)
            .field("description", &self.description)
            .field("enabled", &self.enabled)
            .field("check", &self.check.as_ref().map(|_| "<check>"))
            .finish()
    }
}

/// Every built-in rule, in registration order
pub fn builtin_rules() -> Vec<(&'static str, RuleSpec)> {
    vec![
        (page_title::RULE_ID, page_title::spec()),
        (lang_html::RULE_ID, lang_html::spec()),
        (img_alt::RULE_ID, img_alt::spec()),
        (heading_order::RULE_ID, heading_order::spec()),
        (link_name::RULE_ID, link_name::spec()),
        (color_contrast::RULE_ID, color_contrast::spec()),
        (color_contrast::ENHANCED_RULE_ID, color_contrast::enhanced_spec()),
        (multiple_ways::RULE_ID, multiple_ways::spec()),
        (text_spacing::RULE_ID, text_spacing::spec()),
        (images_of_text::RULE_ID, images_of_text::spec()),
        (alt_indicates_longdesc::RULE_ID, alt_indicates_longdesc::spec()),
        (icon_labels::RULE_ID, icon_labels::spec()),
        (semantic_landmarks::RULE_ID, semantic_landmarks::spec()),
        (links_vs_buttons::RULE_ID, links_vs_buttons::spec()),
        (keyboard_operable::RULE_ID, keyboard_operable::spec()),
        (focus_trap::RULE_ID, focus_trap::spec()),
    ]
}

/// Register every built-in rule with the runner
pub fn register_builtin_rules(runner: &mut AuditRunner) -> Result<()> {
    for (id, spec) in builtin_rules() {
        runner.register(id, spec)?;
    }
    Ok(())
}
