// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for wcag-auditor

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AuditError>;

/// Main error type for the auditor
#[derive(Error, Debug)]
pub enum AuditError {
    /// A rule was registered without a check function
    #[error("Rule {rule_id} must provide a check function")]
    ContractViolation { rule_id: String },

    #[error("Invalid CSS selector: {0}")]
    Selector(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failures of the request/response channel between the audit host and its callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("No active target found")]
    NoActiveTarget,

    /// Browser-internal pages cannot host an auditor
    #[error("Cannot audit browser-internal page: {0}")]
    RestrictedTarget(String),

    #[error("Could not establish connection. Receiving end does not exist: {0}")]
    ReceiverUnavailable(String),

    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Unexpected response: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Whether the failure means the page-side counterpart is stale or was never injected
    pub fn is_missing_receiver(&self) -> bool {
        matches!(self, TransportError::ReceiverUnavailable(_))
    }
}
