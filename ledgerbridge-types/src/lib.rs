//! Core type definitions for ledgerbridge.
//!
//! This crate defines the plain data shared by every other crate:
//! - Company identity and the fixed set of synced domains
//! - Customer and inventory records as delivered by the ERP agent
//! - Content fingerprints
//! - Audit events emitted at each pipeline stage
//!
//! No I/O happens here.

mod audit;
mod company;
mod fingerprint;
mod ids;
mod record;

pub use audit::{AuditAction, AuditEvent, AuditSource, AuditStage, AuditStatus};
pub use company::{Company, Domain};
pub use fingerprint::Fingerprint;
pub use ids::EventId;
pub use record::{Customer, InventoryItem, RecordSet, is_valid_inventory_name};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing types from strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
