// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard operability rule - WCAG 2.1.1 Keyboard (Level A)
//!
//! Interactive behaviour declared in markup must be reachable without a
//! mouse. Flags elements that:
//! - handle mouse events but are neither focusable nor keyboard-handled
//! - are focusable (`tabindex="0"`) with mouse handlers but no key handler
//! - reveal content on hover with no focus equivalent
//! - act as custom controls without an ARIA role
//! - claim `role="button"` or a list/menu role without key handling

use crate::dom::{Document, NodeUtils};
use crate::rules::{Check, RawNode, RawResult, RuleSpec};
use crate::wcag::{Severity, WcagLevel};
use async_trait::async_trait;
use scraper::ElementRef;

pub const RULE_ID: &str = "keyboard-operable";

const KEY_HANDLERS: &[&str] = &["onkeydown", "onkeypress", "onkeyup"];

/// Mouse-only handler attributes and the event each one names
const MOUSE_HANDLERS: &[(&str, &str)] = &[
    ("onclick", "click"),
    ("onmouseover", "mouseover"),
    ("onmouseenter", "mouseenter"),
    ("onmousedown", "mousedown"),
    ("ondblclick", "dblclick"),
    ("@click", "click"),
    ("v-on:click", "click"),
    ("ng-click", "click"),
    ("(click)", "click"),
];

const NATIVE_CONTROLS: &[&str] = &["button", "input", "select", "textarea", "audio", "video"];

pub struct KeyboardOperableRule;

pub fn spec() -> RuleSpec {
    RuleSpec::new()
        .with_wcag("2.1.1", WcagLevel::A)
        .with_severity(Severity::Error)
        .with_description("All functionality must be operable by keyboard (Tab/Enter/Space/arrows)")
        .with_check(KeyboardOperableRule)
}

fn has_attr(element: &ElementRef<'_>, name: &str) -> bool {
    element.value().attr(name).is_some()
}

fn has_key_handler(element: &ElementRef<'_>) -> bool {
    KEY_HANDLERS.iter().any(|attr| has_attr(element, attr))
}

/// Distinct mouse events the element handles, in declaration-table order
fn mouse_events(element: &ElementRef<'_>) -> Vec<&'static str> {
    let mut events = Vec::new();
    for (attr, event) in MOUSE_HANDLERS {
        if has_attr(element, attr) && !events.contains(event) {
            events.push(*event);
        }
    }
    events
}

/// Focusable without `tabindex`: links with `href` and enabled native controls
fn is_natively_focusable(element: &ElementRef<'_>) -> bool {
    match element.value().name() {
        "a" => has_attr(element, "href"),
        name if NATIVE_CONTROLS.contains(&name) => !has_attr(element, "disabled"),
        _ => false,
    }
}

#[async_trait(?Send)]
impl Check for KeyboardOperableRule {
    async fn check(&self, document: &Document, utils: &NodeUtils) -> anyhow::Result<RawResult> {
        let mut nodes = Vec::new();

        for element in document.select("*")? {
            let events = mouse_events(&element);
            if events.is_empty() || is_natively_focusable(&element) {
                continue;
            }
            let has_tabindex = has_attr(&element, "tabindex");
            let has_keys = has_key_handler(&element);
            if has_tabindex && has_keys {
                continue;
            }

            let mut missing = Vec::new();
            if !has_tabindex {
                missing.push("tabindex=\"0\"");
            }
            if !has_keys {
                missing.push("a key handler (onkeydown/onkeypress)");
            }
            nodes.push(RawNode::for_element(
                utils,
                &element,
                format!(
                    "This <{}> handles {} but cannot be operated by keyboard. Missing: {}. Prefer a native <button> or <a href>; otherwise add tabindex=\"0\", a role and Enter/Space handling.",
                    element.value().name(),
                    events.join(", "),
                    missing.join(" and ")
                ),
            ));
        }

        for element in document.select(r#"[tabindex="0"]"#)? {
            if is_natively_focusable(&element) || has_key_handler(&element) || mouse_events(&element).is_empty() {
                continue;
            }
            nodes.push(RawNode::for_element(
                utils,
                &element,
                "This element is focusable (tabindex=\"0\") and has mouse handlers but ignores keys. Add onkeydown handling for Enter and Space.",
            ));
        }

        for element in document.select("[onmouseover], [onmouseenter]")? {
            let focusable = is_natively_focusable(&element) || has_attr(&element, "tabindex");
            let focus_equivalent = has_attr(&element, "onfocus") || has_key_handler(&element);
            if !focusable || !focus_equivalent {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    "This element reacts to hover (mouseover/mouseenter) with no keyboard equivalent. Add tabindex=\"0\" and an onfocus handler that does the same.",
                ));
            }
        }

        for element in document.select(r#"[tabindex="0"]:not(a):not(button):not(input):not(select):not(textarea)"#)? {
            if !mouse_events(&element).is_empty() && !has_attr(&element, "role") {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    "This custom control is focusable and interactive but has no ARIA role. Add role=\"button\", role=\"link\", role=\"checkbox\", role=\"tab\" or similar.",
                ));
            }
        }

        for element in document.select(r#"[role="button"]"#)? {
            if element.value().name() != "button" && !has_key_handler(&element) {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    "This element has role=\"button\" but no key handler. Buttons respond to both Enter and Space; a native <button type=\"button\"> does this already.",
                ));
            }
        }

        for element in document.select(r#"[role="listbox"], [role="combobox"], [role="menu"]"#)? {
            if !has_key_handler(&element) {
                nodes.push(RawNode::for_element(
                    utils,
                    &element,
                    format!(
                        "This control has role=\"{}\" but no keyboard navigation. Support arrow keys, Enter/Space, Escape and Home/End.",
                        element.value().attr("role").unwrap_or_default()
                    ),
                ));
            }
        }

        Ok(RawResult::from_nodes(nodes))
    }
}
