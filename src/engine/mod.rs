// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule registry and execution engine.
//!
//! The `AuditRunner` owns every registered rule, applies the user
//! configuration (per-rule overrides, target conformance level), executes
//! the eligible rules one after another and normalizes what they report.
//!
//! A rule that fails never fails the run: its error (or panic) is logged and
//! it simply contributes nothing.
//!
//! Configuration overrides are written into each rule's runtime `enabled`
//! flag and stay there. A later run without overrides for a rule sees the
//! state left by the previous one; `restore_defaults` resets it explicitly.

mod normalize;

pub use normalize::{
    normalize_result, NormalizedViolation, ViolationNode, DEFAULT_HELP, MISSING_SELECTOR,
    SNIPPET_MAX_LEN,
};

use crate::config::{load_user_config_or_default, ConfigStore, UserConfig};
use crate::dom::{Document, NodeUtils};
use crate::error::{AuditError, Result};
use crate::rules::{Check, RuleSpec};
use crate::wcag::{Severity, WcagLevel, WcagRef};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

/// Description used when a rule registers without one
pub const DEFAULT_DESCRIPTION: &str = "Violation detected";

/// Criterion id recorded when a rule registers without one
pub const MISSING_CRITERION: &str = "N/A";

/// A registered rule. Only `enabled` changes after registration.
pub struct RuleDefinition {
    id: String,
    wcag: WcagRef,
    severity: Severity,
    description: String,
    enabled: bool,
    default_enabled: bool,
    check: Box<dyn Check>,
}

impl RuleDefinition {
    fn from_spec(id: &str, spec: RuleSpec) -> Result<Self> {
        let Some(check) = spec.check else {
            return Err(AuditError::ContractViolation { rule_id: id.to_string() });
        };

        let criterion = spec.wcag_id.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| {
            warn!(rule = %id, "Rule registered without a WCAG criterion id");
            MISSING_CRITERION.to_string()
        });
        let enabled = spec.enabled.unwrap_or(true);

        Ok(Self {
            id: id.to_string(),
            wcag: WcagRef::new(criterion, spec.level.unwrap_or(WcagLevel::A)),
            severity: spec.severity.unwrap_or_default(),
            description: spec.description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            enabled,
            default_enabled: enabled,
            check,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn wcag(&self) -> &WcagRef {
        &self.wcag
    }

    pub fn level(&self) -> WcagLevel {
        self.wcag.level
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current runtime state
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// State the rule was registered with
    pub fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    pub fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: self.id.clone(),
            wcag: self.wcag.clone(),
            severity: self.severity,
            description: self.description.clone(),
            enabled: self.enabled,
        }
    }
}

impl std::fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("id", &self.id)
            .field("wcag", &self.wcag)
            .field("severity", &self.severity)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Read-only projection of a rule, without its check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub id: String,
    pub wcag: WcagRef,
    pub severity: Severity,
    pub description: String,
    pub enabled: bool,
}

/// Counters describing what a run did with each rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub executed: usize,
    pub skipped_disabled: usize,
    pub skipped_level: usize,
    pub failed: usize,
    pub violations: usize,
}

/// Result of `AuditRunner::run_with_stats`
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub violations: Vec<NormalizedViolation>,
    pub stats: RunStats,
    /// Configuration the run was filtered with
    pub config: UserConfig,
}

/// Rule registry and execution engine
pub struct AuditRunner {
    rules: Vec<RuleDefinition>,
    index: HashMap<String, usize>,
    utils: NodeUtils,
    config_store: Option<Rc<dyn ConfigStore>>,
}

impl Default for AuditRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
            utils: NodeUtils::default(),
            config_store: None,
        }
    }

    /// Where `run` loads the configuration from when the caller supplies none
    pub fn with_config_store(mut self, store: Rc<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    /// Node helpers handed to every check
    pub fn with_node_utils(mut self, utils: NodeUtils) -> Self {
        self.utils = utils;
        self
    }

    /// Register a rule, overwriting any earlier rule with the same id in place.
    ///
    /// Fails with `ContractViolation` when no check is supplied; the
    /// registry is left untouched in that case.
    pub fn register(&mut self, id: &str, spec: RuleSpec) -> Result<()> {
        let definition = RuleDefinition::from_spec(id, spec)?;
        debug!(rule = %id, level = %definition.level(), enabled = definition.enabled, "Registered rule");

        match self.index.get(id) {
            Some(&slot) => self.rules[slot] = definition,
            None => {
                self.index.insert(id.to_string(), self.rules.len());
                self.rules.push(definition);
            }
        }
        Ok(())
    }

    /// Flip a rule's runtime flag. Unknown ids are logged and ignored.
    pub fn set_rule_enabled(&mut self, id: &str, enabled: bool) {
        match self.index.get(id) {
            Some(&slot) => self.rules[slot].enabled = enabled,
            None => warn!(rule = %id, "Rule not found"),
        }
    }

    /// Reset every rule's runtime flag to the state it was registered with
    pub fn restore_defaults(&mut self) {
        for rule in &mut self.rules {
            rule.enabled = rule.default_enabled;
        }
    }

    pub fn get_rule(&self, id: &str) -> Option<&RuleDefinition> {
        self.index.get(id).map(|&slot| &self.rules[slot])
    }

    /// Metadata of every rule, in registration order
    pub fn list_rules(&self) -> Vec<RuleMetadata> {
        self.rules.iter().map(RuleDefinition::metadata).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every enabled rule at or below the target level against `document`
    pub async fn run(
        &mut self,
        document: &Document,
        config: Option<&UserConfig>,
    ) -> Vec<NormalizedViolation> {
        self.run_with_stats(document, config).await.violations
    }

    /// `run`, also reporting what happened to each rule
    pub async fn run_with_stats(
        &mut self,
        document: &Document,
        config: Option<&UserConfig>,
    ) -> RunOutcome {
        let config = match config {
            Some(config) => config.clone(),
            None => self.load_config().await,
        };
        self.apply_overrides(&config);

        let target_rank = config.target_level.rank();
        info!(
            rules = self.rules.len(),
            target_level = %config.target_level,
            url = document.url().unwrap_or("<unknown>"),
            "Starting audit"
        );

        let mut violations = Vec::new();
        let mut stats = RunStats::default();

        for rule in &self.rules {
            if !rule.enabled {
                debug!(rule = %rule.id, "Skipped: disabled");
                stats.skipped_disabled += 1;
                continue;
            }

            if rule.level().rank() > target_rank {
                debug!(rule = %rule.id, level = %rule.level(), "Skipped: above target level");
                stats.skipped_level += 1;
                continue;
            }

            stats.executed += 1;
            let checked = AssertUnwindSafe(rule.check.check(document, &self.utils))
                .catch_unwind()
                .await;
            let raw = match checked {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) => {
                    warn!(rule = %rule.id, error = %e, "Rule check failed");
                    stats.failed += 1;
                    continue;
                }
                Err(panic) => {
                    error!(rule = %rule.id, panic = %panic_message(panic.as_ref()), "Rule check panicked");
                    stats.failed += 1;
                    continue;
                }
            };

            match normalize_result(&rule.id, rule, raw) {
                Some(violation) => {
                    debug!(rule = %rule.id, nodes = violation.node_count(), "Violations found");
                    violations.push(violation);
                }
                None => debug!(rule = %rule.id, "Passed"),
            }
        }

        stats.violations = violations.len();
        info!(
            executed = stats.executed,
            skipped_disabled = stats.skipped_disabled,
            skipped_level = stats.skipped_level,
            failed = stats.failed,
            violations = stats.violations,
            "Audit complete"
        );

        RunOutcome { violations, stats, config }
    }

    async fn load_config(&self) -> UserConfig {
        match &self.config_store {
            Some(store) => load_user_config_or_default(store.as_ref()).await,
            None => UserConfig::default(),
        }
    }

    fn apply_overrides(&mut self, config: &UserConfig) {
        for (id, &enabled) in &config.enabled_rules {
            self.set_rule_enabled(id, enabled);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl std::fmt::Debug for AuditRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRunner")
            .field("rules", &self.rules)
            .field("has_config_store", &self.config_store.is_some())
            .finish()
    }
}
