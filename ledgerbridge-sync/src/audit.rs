//! Audit event sinks.
//!
//! Emission is best effort. A sink never reports failure to its caller:
//! whatever goes wrong is logged locally and dropped, so the audit channel
//! cannot change the outcome of a sync.

use async_trait::async_trait;
use ledgerbridge_types::AuditEvent;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Emits one event. Must not panic and has no failure channel.
    async fn emit(&self, event: AuditEvent);
}

/// Posts each event as JSON to the event-log endpoint.
pub struct HttpAuditSink {
    client: Client,
    url: String,
}

impl HttpAuditSink {
    /// Creates an audit sink. Every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> crate::SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn emit(&self, event: AuditEvent) {
        match self.client.post(&self.url).json(&event).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Audit event {} sent", event.event_id);
            }
            Ok(response) => {
                warn!(
                    "Audit event {} rejected with {}",
                    event.event_id,
                    response.status()
                );
            }
            Err(e) => {
                warn!("Audit event {} send failed: {}", event.event_id, e);
            }
        }
    }
}

/// Writes events to the local log only. Used when no audit endpoint is
/// configured.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) {
        if event.is_error() {
            warn!(
                company = %event.company,
                module = %event.domain,
                stage = ?event.stage,
                details = %event.details,
                "{}",
                event.message
            );
        } else {
            info!(
                company = %event.company,
                module = %event.domain,
                stage = ?event.stage,
                "{}",
                event.message
            );
        }
    }
}

/// Forwards every event to each inner sink in turn.
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl AuditSink for FanoutAuditSink {
    async fn emit(&self, event: AuditEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}
