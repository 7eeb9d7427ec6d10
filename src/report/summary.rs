// SPDX-License-Identifier: PMPL-1.0-or-later
//! Aggregations over audit results: per-level KPIs, filtering and statistics.

use crate::engine::NormalizedViolation;
use crate::report::export::ExportRow;
use crate::wcag::{Severity, WcagLevel};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Flagged node counts for one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }
}

/// Errors and warnings per conformance level, counted in nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelKpis {
    #[serde(rename = "A")]
    pub a: LevelCounts,
    #[serde(rename = "AA")]
    pub aa: LevelCounts,
    #[serde(rename = "AAA")]
    pub aaa: LevelCounts,
}

impl LevelKpis {
    pub fn from_violations(violations: &[NormalizedViolation]) -> Self {
        let mut kpis = Self::default();
        for violation in violations {
            let counts = kpis.get_mut(violation.wcag.level);
            match violation.severity {
                Severity::Error => counts.errors += violation.node_count(),
                Severity::Warn => counts.warnings += violation.node_count(),
            }
        }
        kpis
    }

    pub fn get(&self, level: WcagLevel) -> &LevelCounts {
        match level {
            WcagLevel::A => &self.a,
            WcagLevel::AA => &self.aa,
            WcagLevel::AAA => &self.aaa,
        }
    }

    fn get_mut(&mut self, level: WcagLevel) -> &mut LevelCounts {
        match level {
            WcagLevel::A => &mut self.a,
            WcagLevel::AA => &mut self.aa,
            WcagLevel::AAA => &mut self.aaa,
        }
    }

    pub fn total_errors(&self) -> usize {
        self.a.errors + self.aa.errors + self.aaa.errors
    }

    pub fn total_warnings(&self) -> usize {
        self.a.warnings + self.aa.warnings + self.aaa.warnings
    }
}

/// Level and rule selection applied to a result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationFilter {
    pub levels: BTreeSet<WcagLevel>,
    /// `None` keeps every rule
    pub rule: Option<String>,
}

impl Default for ViolationFilter {
    fn default() -> Self {
        Self {
            levels: WcagLevel::ALL.into_iter().collect(),
            rule: None,
        }
    }
}

impl ViolationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(mut self, levels: impl IntoIterator<Item = WcagLevel>) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Toggle one level chip
    pub fn toggle_level(&mut self, level: WcagLevel) {
        if !self.levels.remove(&level) {
            self.levels.insert(level);
        }
    }

    pub fn matches(&self, violation: &NormalizedViolation) -> bool {
        self.levels.contains(&violation.wcag.level)
            && self.rule.as_deref().map_or(true, |rule| violation.rule_id == rule)
    }

    pub fn apply(&self, violations: &[NormalizedViolation]) -> Vec<NormalizedViolation> {
        violations.iter().filter(|v| self.matches(v)).cloned().collect()
    }
}

/// Distinct rule ids in the results, sorted
pub fn rule_filter_options(violations: &[NormalizedViolation]) -> Vec<String> {
    violations
        .iter()
        .map(|v| v.rule_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Counts over export rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: usize,
    pub by_level: BTreeMap<WcagLevel, usize>,
    pub by_severity: BTreeMap<String, usize>,
    pub by_rule: BTreeMap<String, usize>,
}

impl Statistics {
    pub fn from_rows(rows: &[ExportRow]) -> Self {
        let mut stats = Self {
            total: rows.len(),
            by_level: WcagLevel::ALL.into_iter().map(|l| (l, 0)).collect(),
            by_severity: BTreeMap::new(),
            by_rule: BTreeMap::new(),
        };
        for row in rows {
            *stats.by_level.entry(row.level).or_default() += 1;
            *stats.by_severity.entry(row.severity.to_string()).or_default() += 1;
            *stats.by_rule.entry(row.rule.clone()).or_default() += 1;
        }
        stats
    }
}
