// SPDX-License-Identifier: PMPL-1.0-or-later
//! WCAG vocabulary shared by rules, the engine and reports.

use serde::{Deserialize, Serialize};

/// Severity of a violation, independent of its WCAG level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed
    #[default]
    Error,
    /// Should be reviewed
    Warn,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl WcagLevel {
    pub const ALL: [WcagLevel; 3] = [WcagLevel::A, WcagLevel::AA, WcagLevel::AAA];

    /// Ordinal used for level filtering: A=1, AA=2, AAA=3
    pub fn rank(&self) -> u8 {
        match self {
            WcagLevel::A => 1,
            WcagLevel::AA => 2,
            WcagLevel::AAA => 3,
        }
    }

    /// Parse a level label exactly as it appears in stored data ("A", "AA", "AAA").
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "A" => Some(WcagLevel::A),
            "AA" => Some(WcagLevel::AA),
            "AAA" => Some(WcagLevel::AAA),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WcagLevel::A => "A",
            WcagLevel::AA => "AA",
            WcagLevel::AAA => "AAA",
        }
    }
}

impl std::fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WcagLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WcagLevel::from_label(&s.to_uppercase())
            .ok_or_else(|| format!("Unknown WCAG level: {}", s))
    }
}

/// Reference to a WCAG success criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WcagRef {
    /// Criterion number, e.g. "1.1.1"
    pub id: String,
    pub level: WcagLevel,
}

impl WcagRef {
    pub fn new(id: impl Into<String>, level: WcagLevel) -> Self {
        Self { id: id.into(), level }
    }

    /// Link to the W3C "Understanding" page for this criterion
    pub fn help_url(&self) -> String {
        format!("https://www.w3.org/WAI/WCAG21/Understanding/{}", self.id)
    }
}

impl std::fmt::Display for WcagRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_rank_order() {
        assert!(WcagLevel::A.rank() < WcagLevel::AA.rank());
        assert!(WcagLevel::AA.rank() < WcagLevel::AAA.rank());
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("aa".parse::<WcagLevel>().unwrap(), WcagLevel::AA);
        assert_eq!(WcagLevel::from_label("AAA"), Some(WcagLevel::AAA));
        assert_eq!(WcagLevel::from_label("aa"), None);
        assert!("B".parse::<WcagLevel>().is_err());
    }

    #[test]
    fn test_severity_serde() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        let parsed: Severity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, Severity::Error);
    }

    #[test]
    fn test_wcag_ref_display() {
        let wcag = WcagRef::new("1.4.3", WcagLevel::AA);
        assert_eq!(wcag.to_string(), "1.4.3 (AA)");
        assert!(wcag.help_url().ends_with("/1.4.3"));
    }
}
