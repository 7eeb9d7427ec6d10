// SPDX-License-Identifier: PMPL-1.0-or-later
//! Request/response transport between a caller (CLI, popup, test) and the
//! audit host that owns the rules and the page under audit.
//!
//! Three requests exist: `START_AUDIT`, `HIGHLIGHT` and `GET_RULES`. The
//! `Messenger` refuses to talk when there is no active target or when the
//! target is a browser-internal page, and bounds every round trip with a
//! single timeout. There are no retries.

use crate::config::UserConfig;
use crate::dom::Document;
use crate::engine::{AuditRunner, NormalizedViolation, RuleMetadata};
use crate::error::TransportError;
use crate::highlight::{HighlightNode, Highlighter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Round-trip limit used by `Messenger::new`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// URL prefixes of pages that cannot host an auditor
pub const RESTRICTED_PREFIXES: &[&str] = &["chrome://", "chrome-extension://", "edge://", "about:"];

/// Whether a page address belongs to the browser itself
pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

/// Messages accepted by the audit host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Run the registered rules; `None` lets the host load the stored config
    StartAudit {
        #[serde(default)]
        config: Option<UserConfig>,
    },
    /// Mark elements; an empty list clears
    Highlight {
        #[serde(default)]
        nodes: Vec<HighlightNode>,
    },
    GetRules,
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::StartAudit { .. } => "START_AUDIT",
            Request::Highlight { .. } => "HIGHLIGHT",
            Request::GetRules => "GET_RULES",
        }
    }
}

/// Answer to `START_AUDIT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub success: bool,
    #[serde(default)]
    pub violations: Vec<NormalizedViolation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Sum of node counts over all violations
    #[serde(default)]
    pub total_violations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditResponse {
    pub fn completed(violations: Vec<NormalizedViolation>, url: Option<String>) -> Self {
        let total_violations = violations.iter().map(NormalizedViolation::node_count).sum();
        Self {
            success: true,
            violations,
            timestamp: Some(Utc::now()),
            url,
            total_violations,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            violations: Vec::new(),
            timestamp: None,
            url: None,
            total_violations: 0,
            error: Some(error.into()),
        }
    }
}

/// Answer to `GET_RULES`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesResponse {
    pub success: bool,
    pub rules: Vec<RuleMetadata>,
}

/// Host replies, one shape per request kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Audit(AuditResponse),
    Rules(RulesResponse),
    Ack { success: bool },
}

/// The page side: rules, the document under audit and its highlights
pub struct AuditHost {
    runner: AuditRunner,
    document: Document,
    highlighter: Highlighter,
}

impl AuditHost {
    pub fn new(runner: AuditRunner, document: Document) -> Self {
        Self {
            runner,
            document,
            highlighter: Highlighter::new(),
        }
    }

    pub fn runner(&self) -> &AuditRunner {
        &self.runner
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub async fn handle(&mut self, request: Request) -> Response {
        debug!(request = request.kind(), "Message received");
        match request {
            Request::StartAudit { config } => {
                let violations = self.runner.run(&self.document, config.as_ref()).await;
                let url = self.document.url().map(str::to_string);
                Response::Audit(AuditResponse::completed(violations, url))
            }
            Request::Highlight { nodes } => {
                self.highlighter.apply(&self.document, &nodes);
                Response::Ack { success: true }
            }
            Request::GetRules => Response::Rules(RulesResponse {
                success: true,
                rules: self.runner.list_rules(),
            }),
        }
    }
}

/// One request, one response
#[async_trait(?Send)]
pub trait Channel {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// In-process channel to an `AuditHost`.
///
/// Access to the host is serialized; a channel without a host behaves like
/// a page whose auditor was never injected.
#[derive(Clone, Default)]
pub struct LocalChannel {
    host: Rc<Mutex<Option<AuditHost>>>,
}

impl LocalChannel {
    /// A channel with no host attached
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(host: AuditHost) -> Self {
        Self {
            host: Rc::new(Mutex::new(Some(host))),
        }
    }

    pub async fn attach(&self, host: AuditHost) {
        *self.host.lock().await = Some(host);
    }

    /// Remove the host, returning it
    pub async fn detach(&self) -> Option<AuditHost> {
        self.host.lock().await.take()
    }
}

#[async_trait(?Send)]
impl Channel for LocalChannel {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let mut guard = self.host.lock().await;
        match guard.as_mut() {
            Some(host) => Ok(host.handle(request).await),
            None => Err(TransportError::ReceiverUnavailable(format!(
                "no audit host for {}",
                request.kind()
            ))),
        }
    }
}

/// The page a messenger talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub title: Option<String>,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), title: None }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Caller side of the transport
pub struct Messenger<C: Channel> {
    channel: C,
    target: Option<Target>,
    timeout: Duration,
}

impl<C: Channel> Messenger<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            target: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn set_target(&mut self, target: Option<Target>) {
        self.target = target;
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Deliver a request to the active target and wait for its answer
    pub async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let target = self.target.as_ref().ok_or(TransportError::NoActiveTarget)?;
        if is_restricted_url(&target.url) {
            return Err(TransportError::RestrictedTarget(target.url.clone()));
        }

        debug!(request = request.kind(), url = %target.url, "Sending message");
        tokio::time::timeout(self.timeout, self.channel.send(request))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
    }

    /// Ask the target to run an audit. Transport failures come back as an
    /// unsuccessful response carrying the error text.
    pub async fn request_audit(&self, config: Option<UserConfig>) -> AuditResponse {
        match self.send(Request::StartAudit { config }).await {
            Ok(Response::Audit(response)) => {
                info!(total = response.total_violations, "Audit response received");
                response
            }
            Ok(other) => {
                let e = TransportError::Protocol(format!("expected audit response, got {:?}", other));
                error!(error = %e, "Audit request failed");
                AuditResponse::failed(e.to_string())
            }
            Err(e) => {
                error!(error = %e, "Audit request failed");
                AuditResponse::failed(e.to_string())
            }
        }
    }

    pub async fn request_highlight(&self, nodes: Vec<HighlightNode>) -> Result<(), TransportError> {
        match self.send(Request::Highlight { nodes }).await {
            Ok(Response::Ack { success: true }) => Ok(()),
            Ok(other) => Err(TransportError::Protocol(format!(
                "expected acknowledgement, got {:?}",
                other
            ))),
            Err(e) => {
                error!(error = %e, "Highlight request failed");
                Err(e)
            }
        }
    }

    /// Rule list of the target; empty when it cannot be reached
    pub async fn get_rules(&self) -> Vec<RuleMetadata> {
        match self.send(Request::GetRules).await {
            Ok(Response::Rules(response)) => response.rules,
            Ok(_) => Vec::new(),
            Err(e) => {
                error!(error = %e, "Fetching rules failed");
                Vec::new()
            }
        }
    }
}
