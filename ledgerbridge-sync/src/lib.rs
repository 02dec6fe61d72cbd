//! Change-detecting sync from a local ERP agent to the cloud.
//!
//! Each run walks every configured company and, for each, the customers
//! and inventory domains. A unit of work fetches the current record set,
//! fingerprints it, and delivers it only when the fingerprint differs
//! from the one recorded after the last successful delivery.
//!
//! # Architecture
//!
//! ```text
//! Scheduler ─► SyncOrchestrator ─► Fetcher ─► fingerprint() ─► FingerprintStore
//!                     │                                              │
//!                     └─► AuditSink (every stage)      Delivery ◄────┘ (changed only)
//! ```
//!
//! The collaborators sit behind traits so the orchestrator can be driven
//! with in-process fakes.

pub mod audit;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod orchestrator;
pub mod scheduler;

pub use audit::{AuditSink, FanoutAuditSink, HttpAuditSink, TracingAuditSink};
pub use config::{
    DEFAULT_INVENTORY_BATCH_SIZE, DeliveryConfig, EndpointConfig, ErpAgentConfig, ScheduleConfig,
    StatusConfig, StoreConfig, SyncConfig,
};
pub use delivery::{BatchPolicy, Delivery, DeliveryReport, HttpDelivery};
pub use error::{SyncError, SyncResult};
pub use fetcher::{AgentFetcher, Fetcher};
pub use fingerprint::fingerprint;
pub use orchestrator::{RunReport, SyncOrchestrator, UnitOutcome, UnitReport};
pub use scheduler::Scheduler;
