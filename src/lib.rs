// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcag-auditor - WCAG rule engine for HTML pages
//!
//! Independent accessibility rules are registered with an [`engine::AuditRunner`],
//! filtered by the user's target conformance level and per-rule overrides,
//! executed against a parsed document, and their findings normalized into a
//! single violation schema that reports and exports consume.
//!
//! ## Modules
//!
//! - **engine**: rule registry, level/override filtering, normalization
//! - **rules**: the rule contract and built-in rules
//! - **contrast**: color parsing, relative luminance and contrast ratios
//! - **config**: persisted user configuration
//! - **messaging**: request/response transport to an audit host
//! - **highlight**: marking flagged elements
//! - **report**: text, JSON and CSV output, KPIs and statistics
//! - **scanner**: auditing HTML files on disk

pub mod config;
pub mod contrast;
pub mod dom;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod messaging;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod wcag;

pub use error::{AuditError, Result};
