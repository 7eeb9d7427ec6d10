// SPDX-License-Identifier: PMPL-1.0-or-later
//! User configuration: target conformance level and per-rule overrides.
//!
//! The record is stored under the `wcagConfig` key of a small key-value
//! store. Loading never fails from the engine's point of view: a missing or
//! unreadable store yields the default configuration (AA, no overrides).

use crate::error::{AuditError, Result};
use crate::wcag::WcagLevel;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Key under which the configuration is persisted
pub const STORAGE_KEY: &str = "wcagConfig";

/// Target level used when none is stored or the stored one is not recognized
pub const DEFAULT_TARGET_LEVEL: WcagLevel = WcagLevel::AA;

/// User preferences read at the start of every audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    /// Highest WCAG level whose rules are executed
    #[serde(default = "default_target_level", deserialize_with = "lenient_level")]
    pub target_level: WcagLevel,

    /// Explicit enable/disable overrides keyed by rule id
    #[serde(default)]
    pub enabled_rules: BTreeMap<String, bool>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            enabled_rules: BTreeMap::new(),
        }
    }
}

fn default_target_level() -> WcagLevel {
    DEFAULT_TARGET_LEVEL
}

fn lenient_level<'de, D>(deserializer: D) -> std::result::Result<WcagLevel, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Label(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Label(label)) => WcagLevel::from_label(&label).unwrap_or_else(|| {
            warn!(value = %label, "Unrecognized target level, using {}", DEFAULT_TARGET_LEVEL);
            DEFAULT_TARGET_LEVEL
        }),
        Some(Raw::Other(_)) | None => DEFAULT_TARGET_LEVEL,
    })
}

impl UserConfig {
    pub fn new(target_level: WcagLevel) -> Self {
        Self {
            target_level,
            ..Self::default()
        }
    }

    pub fn with_rule(mut self, rule_id: &str, enabled: bool) -> Self {
        self.enabled_rules.insert(rule_id.to_string(), enabled);
        self
    }

    pub fn set_rule_enabled(&mut self, rule_id: &str, enabled: bool) {
        self.enabled_rules.insert(rule_id.to_string(), enabled);
    }

    /// The explicit override for a rule, if any
    pub fn rule_override(&self, rule_id: &str) -> Option<bool> {
        self.enabled_rules.get(rule_id).copied()
    }

    /// Factory settings: AA with every listed rule explicitly enabled
    pub fn reset_for<'a>(rule_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            target_level: DEFAULT_TARGET_LEVEL,
            enabled_rules: rule_ids.into_iter().map(|id| (id.to_string(), true)).collect(),
        }
    }
}

/// Persistent key-value storage for the user configuration
#[async_trait(?Send)]
pub trait ConfigStore {
    /// The stored configuration, or `None` when nothing was saved yet
    async fn load_user_config(&self) -> Result<Option<UserConfig>>;

    async fn save_user_config(&self, config: &UserConfig) -> Result<()>;
}

/// Load the configuration, substituting defaults on absence or failure
pub async fn load_user_config_or_default(store: &dyn ConfigStore) -> UserConfig {
    match store.load_user_config().await {
        Ok(Some(config)) => {
            debug!(target_level = %config.target_level, overrides = config.enabled_rules.len(), "Loaded user configuration");
            config
        }
        Ok(None) => {
            info!("No saved configuration, using defaults");
            UserConfig::default()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load configuration, using defaults");
            UserConfig::default()
        }
    }
}

/// JSON file holding a key-value object, configuration under `wcagConfig`
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default location (~/.wcag-auditor/config.json)
    pub fn default_location() -> Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| AuditError::Config("HOME environment variable not set".to_string()))?;
        Ok(Self::new(PathBuf::from(home).join(".wcag-auditor").join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_object(&self) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let json = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<serde_json::Value>(&json)? {
            serde_json::Value::Object(map) => Ok(Some(map)),
            _ => Err(AuditError::Config(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait(?Send)]
impl ConfigStore for FileConfigStore {
    async fn load_user_config(&self) -> Result<Option<UserConfig>> {
        let Some(mut object) = self.read_object().await? else {
            return Ok(None);
        };
        match object.remove(STORAGE_KEY) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    async fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let mut object = self.read_object().await?.unwrap_or_default();
        object.insert(STORAGE_KEY.to_string(), serde_json::to_value(config)?);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&serde_json::Value::Object(object))?;
        tokio::fs::write(&self.path, json).await?;

        debug!(path = %self.path.display(), "Saved user configuration");
        Ok(())
    }
}

/// In-memory store; can be switched to fail every call to simulate unavailable storage
#[derive(Debug)]
pub struct MemoryConfigStore {
    config: RefCell<Option<UserConfig>>,
    available: Cell<bool>,
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self {
            config: RefCell::new(None),
            available: Cell::new(true),
        }
    }
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UserConfig) -> Self {
        Self {
            config: RefCell::new(Some(config)),
            available: Cell::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.get() {
            Ok(())
        } else {
            Err(AuditError::Config("storage unavailable".to_string()))
        }
    }
}

#[async_trait(?Send)]
impl ConfigStore for MemoryConfigStore {
    async fn load_user_config(&self) -> Result<Option<UserConfig>> {
        self.ensure_available()?;
        Ok(self.config.borrow().clone())
    }

    async fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        self.ensure_available()?;
        *self.config.borrow_mut() = Some(config.clone());
        Ok(())
    }
}
