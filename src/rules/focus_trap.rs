// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard trap rule - WCAG 2.1.2 No Keyboard Trap (Level A)
//!
//! Static markup checks for places where keyboard focus can get stuck:
//! - dialogs with no Escape handling, no close button or nothing focusable
//! - expanded menus with no Escape handling
//! - third-party iframes
//! - positive `tabindex` values
//! - click-to-close overlays that keyboard users cannot dismiss
//! - key handlers that swallow Tab outside a dialog
//!
//! Escape handling is recognized in inline key handler attributes on the
//! element itself or on `<html>`/`<body>`.

use crate::dom::{select_within, style_declarations, Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "focus-trap";

const KEY_HANDLERS: &[&str] = &["onkeydown", "onkeyup", "onkeypress"];

/// Handler fragments that reference the Escape key
const ESCAPE_MARKERS: &[&str] = &["Escape", "Esc", "27"];

const POSSIBLE_DIALOGS: &str = r#"[role="dialog"], [role="alertdialog"], [aria-modal="true"], [class*="modal"], [id*="modal"], [class*="dialog"], [id*="dialog"]"#;

const POSSIBLE_MENUS: &str = r#"[role="menu"], [role="menubar"], [role="listbox"], [role="combobox"], [class*="menu"]:not([class*="menu-item"]), [class*="dropdown"]"#;

const CLOSE_CONTROLS: &str = r#"button[aria-label*="lose"], button[aria-label*="echar"], button[class*="close"], button[class*="dismiss"], [role="button"][aria-label*="lose"], button[data-dismiss], button[data-bs-dismiss]"#;

const FOCUSABLE: &str = r#"a[href], button:not([disabled]), input:not([disabled]), select:not([disabled]), textarea:not([disabled]), [tabindex]:not([tabindex="-1"])"#;

const OVERLAYS: &str = r#"[class*="overlay"], [class*="backdrop"], [class*="mask"]"#;

pub struct FocusTrapRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("2.1.2", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("There must be no keyboard trap: users must be able to leave dialogs and menus with Tab/Escape")
        .with_check(FocusTrapRule)
}

fn lowercase_attr(element: &ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().to_lowercase()
}

fn is_dialog(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    let class = lowercase_attr(element, "class");
    let id = lowercase_attr(element, "id");
    matches!(value.attr("role"), Some("dialog") | Some("alertdialog"))
        || value.attr("aria-modal") == Some("true")
        || ["modal", "dialog", "popup"].iter().any(|k| class.contains(k))
        || ["modal", "dialog"].iter().any(|k| id.contains(k))
}

fn is_menu(element: &ElementRef<'_>) -> bool {
    let class = lowercase_attr(element, "class");
    let id = lowercase_attr(element, "id");
    matches!(
        element.value().attr("role"),
        Some("menu") | Some("menubar") | Some("listbox") | Some("combobox")
    ) || ["menu", "dropdown"].iter().any(|k| class.contains(k) || id.contains(k))
}

fn handles_escape(element: &ElementRef<'_>) -> bool {
    KEY_HANDLERS.iter().any(|attr| {
        element
            .value()
            .attr(attr)
            .is_some_and(|handler| ESCAPE_MARKERS.iter().any(|marker| handler.contains(marker)))
    })
}

/// Escape handled on the element or at document level
fn escape_reachable(document: &Document, element: &ElementRef<'_>) -> bool {
    handles_escape(element) || handles_escape(&document.root()) || document.body().is_some_and(|b| handles_escape(&b))
}

fn inline_style_value(element: &ElementRef<'_>, property: &str) -> Option<String> {
    let style = element.value().attr("style")?;
    style_declarations(style)
        .into_iter()
        .rev()
        .find(|(name, _)| name == property)
        .map(|(_, value)| value.to_lowercase())
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    element.value().attr("hidden").is_some()
        || inline_style_value(element, "display").as_deref() == Some("none")
        || inline_style_value(element, "visibility").as_deref() == Some("hidden")
        || inline_style_value(element, "opacity").as_deref() == Some("0")
}

/// `scheme://host[:port]` of an absolute http(s) URL
fn origin(url: &str) -> Option<&str> {
    let rest_at = url.find("://")? + 3;
    if !url[..rest_at].starts_with("http") {
        return None;
    }
    let end = url[rest_at..].find('/').map_or(url.len(), |i| rest_at + i);
    Some(&url[..end])
}

/// An absolute or protocol-relative source not on the page's own origin
fn is_third_party(src: &str, page_origin: Option<&str>) -> bool {
    let absolute = src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//");
    absolute && !page_origin.is_some_and(|o| src.starts_with(o))
}

fn prevents_tab(handler: &str) -> bool {
    handler.contains("preventDefault") && (handler.contains("Tab") || handler.contains('9'))
}

#[async_trait(?Send)]
impl Check for FocusTrapRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        for dialog in document.select(POSSIBLE_DIALOGS)?.into_iter().filter(is_dialog) {
            let escape = escape_reachable(document, &dialog);
            let close = !select_within(&dialog, CLOSE_CONTROLS)?.is_empty();
            if !escape && !close {
                nodes.push(RawNode::for_element(
                    utils,
                    &dialog,
                    "This dialog cannot be closed from the keyboard. Close it on Escape and add a focusable close button (<button aria-label=\"Close\">), then return focus to the element that opened it.",
                ));
            } else if !escape {
                nodes.push(RawNode::for_element(
                    utils,
                    &dialog,
                    "This dialog has a close button but does not respond to Escape. Keyboard users expect Escape to close dialogs.",
                ));
            }

            if select_within(&dialog, FOCUSABLE)?.is_empty() {
                nodes.push(RawNode::for_element(
                    utils,
                    &dialog,
                    "This dialog contains nothing focusable. Add at least a focusable close button.",
                ));
            }
        }

        for menu in document.select(POSSIBLE_MENUS)?.into_iter().filter(is_menu) {
            let expanded = menu.value().attr("aria-expanded") == Some("true");
            if expanded && !is_hidden(&menu) && !escape_reachable(document, &menu) {
                nodes.push(RawNode::for_element(
                    utils,
                    &menu,
                    "This expanded menu does not close on Escape. Close it on Escape, return focus to its trigger and keep aria-expanded in sync.",
                ));
            }
        }

        let page_origin = document.url().and_then(origin);
        for iframe in document.select("iframe")? {
            let src = iframe.value().attr("src").unwrap_or_default();
            if !is_third_party(src, page_origin) {
                continue;
            }
            let title_hint = if iframe.value().attr("title").is_some_and(|t| !t.trim().is_empty()) {
                ""
            } else {
                "Add a descriptive title to the iframe. "
            };
            nodes.push(RawNode::for_element(
                utils,
                &iframe,
                format!(
                    "This iframe embeds third-party content that may trap keyboard focus. {}Make sure Tab can leave it and offer a link to the content outside the frame.",
                    title_hint
                ),
            ));
        }

        for element in document.select("[tabindex]")? {
            let tabindex = element.value().attr("tabindex").and_then(|t| t.trim().parse::<i32>().ok());
            if let Some(tabindex) = tabindex.filter(|t| *t > 0) {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "tabindex=\"{}\" reorders keyboard navigation. Use tabindex=\"0\" for natural order or \"-1\" for programmatic focus only.",
                        tabindex
                    ),
                ));
            }
        }

        for overlay in document.select(OVERLAYS)? {
            if is_hidden(&overlay) {
                continue;
            }
            if overlay.value().attr("onclick").is_some() && overlay.value().attr("tabindex").is_none() {
                nodes.push(RawNode::for_element(
                    utils,
                    &overlay,
                    "This overlay closes on click but not from the keyboard. Close the dialog on Escape instead of relying on overlay clicks.",
                ));
            }
        }

        for element in document.select("[onkeydown], [onkeyup]")? {
            let swallows_tab = ["onkeydown", "onkeyup"]
                .iter()
                .filter_map(|attr| element.value().attr(attr))
                .any(prevents_tab);
            if swallows_tab && !is_dialog(&element) {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    "This element appears to cancel the Tab key. Outside dialog focus management this traps keyboard users; remove preventDefault() for Tab.",
                ));
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
