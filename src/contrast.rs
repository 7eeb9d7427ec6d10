// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast math - WCAG 1.4.3 Contrast (Minimum) and 1.4.6 Contrast (Enhanced)
//!
//! Pure functions, no state:
//! - AA: 4.5:1 for normal text, 3:1 for large text
//! - AAA: 7:1 for normal text, 4.5:1 for large text

use regex::Regex;
use std::sync::OnceLock;

/// An sRGB color as (r, g, b) channels
pub type Rgb = (u8, u8, u8);

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})").expect("valid regex")
    })
}

/// Parse a CSS hex color (#rgb, #rrggbb) into (r, g, b) components
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse an rgb() or rgba() color into (r, g, b); the alpha channel is ignored
pub fn parse_rgb_color(value: &str) -> Option<Rgb> {
    let caps = rgb_regex().captures(value)?;
    let r: u8 = caps[1].parse().ok()?;
    let g: u8 = caps[2].parse().ok()?;
    let b: u8 = caps[3].parse().ok()?;
    Some((r, g, b))
}

/// Parse a CSS color value into (r, g, b).
///
/// Only hex and `rgb()`/`rgba()` notations are understood. Named colors,
/// `hsl()`, gradients and malformed input yield `None`.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.starts_with('#') {
        parse_hex_color(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(&trimmed)
    } else {
        None
    }
}

fn to_linear(channel: u8) -> f64 {
    let v = channel as f64 / 255.0;
    if v <= 0.03928 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance per WCAG 2.x, in [0, 1]
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * to_linear(r) + 0.7152 * to_linear(g) + 0.0722 * to_linear(b)
}

/// Contrast ratio between two colors, in [1, 21]. Argument order does not matter.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let l1 = relative_luminance(a.0, a.1, a.2);
    let l2 = relative_luminance(b.0, b.1, b.2);
    let lighter = l1.max(l2);
    let darker = l1.min(l2);
    (lighter + 0.05) / (darker + 0.05)
}

/// Level AA threshold: 3:1 for large text, 4.5:1 otherwise
pub fn passes_aa(ratio: f64, is_large_text: bool) -> bool {
    if is_large_text {
        ratio >= 3.0
    } else {
        ratio >= 4.5
    }
}

/// Level AAA threshold: 4.5:1 for large text, 7:1 otherwise
pub fn passes_aaa(ratio: f64, is_large_text: bool) -> bool {
    if is_large_text {
        ratio >= 4.5
    } else {
        ratio >= 7.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#000"), Some((0, 0, 0)));
        assert_eq!(parse_hex_color("#ff0000"), Some((255, 0, 0)));
        assert_eq!(parse_hex_color("#abc"), parse_hex_color("#aabbcc"));
        assert_eq!(parse_hex_color("#abcd"), None);
        assert_eq!(parse_hex_color("#ggg"), None);
    }

    #[test]
    fn test_parse_color_short_and_long_hex_agree() {
        assert_eq!(parse_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_color("#ffffff"), Some((255, 255, 255)));
        assert_eq!(parse_color("  #FFFFFF "), Some((255, 255, 255)));
    }

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_color("rgb(255, 0, 0)"), Some((255, 0, 0)));
        assert_eq!(parse_color("rgba(0, 128, 0, 0.5)"), Some((0, 128, 0)));
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_parse_color_rejects_unsupported() {
        assert_eq!(parse_color("not-a-color"), None);
        assert_eq!(parse_color("white"), None);
        assert_eq!(parse_color("hsl(120, 100%, 50%)"), None);
        assert_eq!(parse_color("linear-gradient(red, blue)"), None);
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("#é"), None);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio((255, 255, 255), (0, 0, 0));
        assert!((ratio - 21.0).abs() < 0.01, "Black on white should be 21:1, got {:.3}", ratio);
        let reversed = contrast_ratio((0, 0, 0), (255, 255, 255));
        assert!((ratio - reversed).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contrast_ratio_same_color() {
        for c in [(0, 0, 0), (128, 128, 128), (12, 200, 99), (255, 255, 255)] {
            let ratio = contrast_ratio(c, c);
            assert!((ratio - 1.0).abs() < 0.01, "Same color should be 1:1, got {:.3}", ratio);
        }
    }

    #[test]
    fn test_relative_luminance_bounds() {
        assert!((relative_luminance(255, 255, 255) - 1.0).abs() < 1e-9);
        assert!(relative_luminance(0, 0, 0).abs() < 1e-9);
    }

    #[test]
    fn test_thresholds() {
        assert!(passes_aa(4.5, false));
        assert!(!passes_aa(4.49, false));
        assert!(passes_aa(3.0, true));
        assert!(passes_aaa(7.0, false));
        assert!(!passes_aaa(6.99, false));
        assert!(passes_aaa(4.5, true));
        assert!(!passes_aaa(4.4, true));
    }
}
