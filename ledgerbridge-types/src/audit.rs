//! Audit events emitted at every pipeline stage.
//!
//! Events are outbound telemetry only: they are built, handed to an audit
//! sink, and never read back.

use crate::{Company, Domain, EventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What kind of work the event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Fetch,
    Sync,
}

/// The pipeline stage that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStage {
    Fetch,
    Hash,
    Sync,
}

impl AuditStage {
    /// The action a stage belongs to. Fetching is its own action; hashing
    /// and delivery are both part of the sync action.
    pub const fn action(&self) -> AuditAction {
        match self {
            AuditStage::Fetch => AuditAction::Fetch,
            AuditStage::Hash | AuditStage::Sync => AuditAction::Sync,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Error,
}

/// What triggered the run that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSource {
    /// A scheduler tick.
    Cron,
    /// An operator (CLI `once` or the status API).
    Manual,
}

impl fmt::Display for AuditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditSource::Cron => f.write_str("cron"),
            AuditSource::Manual => f.write_str("manual"),
        }
    }
}

/// A single audit record.
///
/// The wire shape is camelCase and names the domain `module`, which is
/// what the event-log endpoint accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    /// External company name.
    pub company: String,
    pub source: AuditSource,
    #[serde(rename = "module")]
    pub domain: Domain,
    pub action: AuditAction,
    pub stage: AuditStage,
    pub status: AuditStatus,
    pub message: String,
    /// Stage-specific structured data. Always a JSON object.
    #[serde(default = "empty_details")]
    pub details: Value,
}

impl AuditEvent {
    /// Creates an event stamped with a fresh ID and the current time.
    pub fn new(
        company: &Company,
        domain: Domain,
        source: AuditSource,
        stage: AuditStage,
        status: AuditStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: Utc::now(),
            company: company.external_name.clone(),
            source,
            domain,
            action: stage.action(),
            stage,
            status,
            message: message.into(),
            details: empty_details(),
        }
    }

    /// Attaches structured details. Non-object values are wrapped under
    /// a `value` key.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = match details {
            Value::Object(_) => details,
            Value::Null => empty_details(),
            other => serde_json::json!({ "value": other }),
        };
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == AuditStatus::Error
    }
}

fn empty_details() -> Value {
    Value::Object(serde_json::Map::new())
}
