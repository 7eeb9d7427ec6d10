// SPDX-License-Identifier: PMPL-1.0-or-later
//! Parsed documents and the node helpers handed to every rule check.

use crate::error::{AuditError, Result};
use scraper::{ElementRef, Html, Selector};

/// Outer-HTML length above which `NodeUtils::snippet_for` shortens a node
pub const DEFAULT_SNIPPET_LEN: usize = 150;

const ELLIPSIS: &str = "...";

/// Root font size assumed when resolving `em`/`rem` lengths
pub const BASE_FONT_PX: f64 = 16.0;

const PX_PER_PT: f64 = 4.0 / 3.0;

/// An HTML document under audit
pub struct Document {
    html: Html,
    url: Option<String>,
}

impl Document {
    /// Parse a full HTML document
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            url: None,
        }
    }

    /// Attach the address the document was loaded from
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The `<html>` element
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Trimmed text of the first `<title>` element, if any
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
    }

    /// The `<body>` element; the HTML parser always creates one
    pub fn body(&self) -> Option<ElementRef<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next()
    }

    /// All elements matching a CSS selector, in document order
    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).collect())
    }

    /// First element with the given id
    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().id() == Some(id))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("url", &self.url).finish_non_exhaustive()
    }
}

/// Compile a CSS selector, mapping parse failures into `AuditError::Selector`
pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AuditError::Selector(format!("{}: {:?}", css, e)))
}

/// Descendants of `element` matching a CSS selector, in document order
pub fn select_within<'a>(element: &ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let selector = parse_selector(css)?;
    Ok(element.select(&selector).collect())
}

/// Trimmed text content of an element and its descendants
pub fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Declarations of an inline `style` attribute as (lowercase property, value).
///
/// Values are trimmed and lose any `!important` suffix; malformed
/// declarations are skipped.
pub fn style_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(property, value)| {
            let value = value.trim().trim_end_matches("!important").trim();
            (property.trim().to_lowercase(), value.to_string())
        })
        .filter(|(property, _)| !property.is_empty())
        .collect()
}

/// Resolve an absolute or font-relative CSS length to pixels.
///
/// `em` and `rem` are taken against `BASE_FONT_PX`; percentages, `auto`
/// and other units give `None`.
pub fn css_length_px(value: &str) -> Option<f64> {
    let value = value.trim().to_lowercase();
    let (number, scale) = if let Some(n) = value.strip_suffix("rem") {
        (n, BASE_FONT_PX)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, BASE_FONT_PX)
    } else if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, PX_PER_PT)
    } else if value == "0" {
        ("0", 1.0)
    } else {
        return None;
    };
    number.trim().parse::<f64>().ok().map(|n| n * scale)
}

/// Truncate to at most `max` characters (not bytes)
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Selector and snippet generation for flagged elements.
///
/// Passed explicitly into every check so that each rule can describe any
/// node it flags the same way.
#[derive(Debug, Clone)]
pub struct NodeUtils {
    snippet_len: usize,
}

impl Default for NodeUtils {
    fn default() -> Self {
        Self { snippet_len: DEFAULT_SNIPPET_LEN }
    }
}

impl NodeUtils {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snippet_len(mut self, len: usize) -> Self {
        self.snippet_len = len.max(ELLIPSIS.len());
        self
    }

    /// `#id` when the element has one, else `tag.firstClass`, else `tag`
    pub fn selector_for(&self, element: &ElementRef<'_>) -> String {
        let value = element.value();
        if let Some(id) = value.id().filter(|id| !id.trim().is_empty()) {
            return format!("#{}", id);
        }
        let tag = value.name().to_lowercase();
        // `classes()` iterates a hash set; source order lives in the attribute
        match value.attr("class").and_then(|c| c.split_whitespace().next()) {
            Some(class) => format!("{}.{}", tag, class),
            None => tag,
        }
    }

    /// Outer HTML of the element, shortened with a trailing "..." when too long
    pub fn snippet_for(&self, element: &ElementRef<'_>) -> String {
        let html = element.html();
        if html.chars().count() > self.snippet_len {
            let keep = self.snippet_len - ELLIPSIS.len();
            format!("{}{}", truncate_chars(&html, keep), ELLIPSIS)
        } else {
            html
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first<'a>(doc: &'a Document, css: &str) -> ElementRef<'a> {
        doc.select(css).unwrap().into_iter().next().expect("element present")
    }

    #[test]
    fn test_selector_prefers_id() {
        let doc = Document::parse(r#"<div id="main" class="a b"></div>"#);
        let utils = NodeUtils::new();
        assert_eq!(utils.selector_for(&first(&doc, "div")), "#main");
    }

    #[test]
    fn test_selector_falls_back_to_class_then_tag() {
        let doc = Document::parse(r#"<p class="lead intro">x</p><span>y</span>"#);
        let utils = NodeUtils::new();
        assert_eq!(utils.selector_for(&first(&doc, "p")), "p.lead");
        assert_eq!(utils.selector_for(&first(&doc, "span")), "span");
    }

    #[test]
    fn test_selector_uses_first_class_in_source_order() {
        let utils = NodeUtils::new();
        let cases = [
            ("zeta alpha mid", "div.zeta"),
            ("alpha mid zeta", "div.alpha"),
            ("  mid\tzeta alpha  ", "div.mid"),
            ("card card--wide is-active shadow", "div.card"),
        ];
        for (classes, expected) in cases {
            let source = format!(r#"<div class="{}">x</div>"#, classes);
            for _ in 0..64 {
                let doc = Document::parse(&source);
                assert_eq!(utils.selector_for(&first(&doc, "div")), expected, "class=\"{}\"", classes);
            }
        }
    }

    #[test]
    fn test_selector_ignores_blank_class_attribute() {
        let doc = Document::parse(r#"<div class="   ">x</div>"#);
        assert_eq!(NodeUtils::new().selector_for(&first(&doc, "div")), "div");
    }

    #[test]
    fn test_snippet_truncation() {
        let long_text = "x".repeat(300);
        let doc = Document::parse(&format!("<p>{}</p><b>ok</b>", long_text));
        let utils = NodeUtils::new();
        let snippet = utils.snippet_for(&first(&doc, "p"));
        assert_eq!(snippet.chars().count(), DEFAULT_SNIPPET_LEN);
        assert!(snippet.ends_with("..."));
        assert_eq!(utils.snippet_for(&first(&doc, "b")), "<b>ok</b>");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let doc = Document::parse("<p></p>");
        assert!(matches!(doc.select("p[["), Err(AuditError::Selector(_))));
    }

    #[test]
    fn test_title_and_lookup() {
        let doc = Document::parse(
            "<html><head><title>  Home </title></head><body><h1 id='top'>Hi</h1></body></html>",
        )
        .with_url("https://example.org/");
        assert_eq!(doc.title().as_deref(), Some("Home"));
        assert_eq!(doc.url(), Some("https://example.org/"));
        assert!(doc.element_by_id("top").is_some());
        assert!(doc.element_by_id("missing").is_none());
    }

    #[test]
    fn test_select_within_excludes_the_element_itself() {
        let doc = Document::parse(r#"<nav class="menu"><a href="/a">A</a><div class="menu"><a href="/b">B</a></div></nav>"#);
        let nav = first(&doc, "nav");
        assert_eq!(select_within(&nav, "a[href]").unwrap().len(), 2);
        assert_eq!(select_within(&nav, ".menu").unwrap().len(), 1);
        assert!(select_within(&nav, "a[[").is_err());
        assert_eq!(text_of(&nav), "AB");
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_style_declarations() {
        let declarations = style_declarations("Color: #333; ; height:40px !important;bogus;white-space: nowrap;");
        assert_eq!(
            declarations,
            vec![
                ("color".to_string(), "#333".to_string()),
                ("height".to_string(), "40px".to_string()),
                ("white-space".to_string(), "nowrap".to_string()),
            ]
        );
    }

    #[test]
    fn test_css_length_px() {
        assert_eq!(css_length_px("40px"), Some(40.0));
        assert_eq!(css_length_px(" 18PT "), Some(24.0));
        assert_eq!(css_length_px("1.5em"), Some(24.0));
        assert_eq!(css_length_px("2rem"), Some(32.0));
        assert_eq!(css_length_px("0"), Some(0.0));
        assert_eq!(css_length_px("50%"), None);
        assert_eq!(css_length_px("auto"), None);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("ááá", 2), "áá");
        assert_eq!(truncate_chars("ab", 5), "ab");
    }
}
