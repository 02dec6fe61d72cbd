//! Persistent fingerprint store for ledgerbridge.
//!
//! Maps `(company, domain)` to the fingerprint of the last record set that
//! was delivered in full. The sync core reads it before every delivery
//! decision and writes it only after a delivery fully succeeds.
//!
//! Two backends:
//! - [`JsonFileStore`]: a flat JSON object, rewritten as a whole snapshot
//!   through a temp file and an atomic rename
//! - [`SqliteStore`]: one row per key with upsert semantics

mod error;
mod json_store;
mod sqlite_store;

pub use error::{StoreError, StoreResult};
pub use json_store::JsonFileStore;
pub use sqlite_store::SqliteStore;

use ledgerbridge_types::{Company, Domain, Fingerprint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Composite store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FingerprintKey {
    /// External company name.
    pub company: String,
    pub domain: Domain,
}

impl FingerprintKey {
    pub fn new(company: impl Into<String>, domain: Domain) -> Self {
        Self {
            company: company.into(),
            domain,
        }
    }

    /// Key for a configured company.
    pub fn for_company(company: &Company, domain: Domain) -> Self {
        Self::new(company.external_name.clone(), domain)
    }

    /// Parses the flat `{company}_{domain}` form used by the JSON snapshot.
    /// The domain is taken from after the last underscore, so company
    /// names may themselves contain underscores.
    pub fn parse_flat(s: &str) -> Option<Self> {
        let (company, domain) = s.rsplit_once('_')?;
        if company.is_empty() {
            return None;
        }
        Some(Self::new(company, domain.parse().ok()?))
    }
}

impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.company, self.domain)
    }
}

/// One persisted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFingerprint {
    pub key: FingerprintKey,
    pub fingerprint: Fingerprint,
}

/// Durable `(company, domain) → fingerprint` mapping.
///
/// A missing key is not an error: it means the pair has never been
/// delivered. Implementations must tolerate concurrent readers and must
/// never lose a committed entry because a write to another key failed.
pub trait FingerprintStore: Send + Sync {
    /// Returns the backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Returns the last committed fingerprint for a key.
    fn get(&self, key: &FingerprintKey) -> StoreResult<Option<Fingerprint>>;

    /// Commits a fingerprint, replacing any previous value for the key.
    fn set(&self, key: &FingerprintKey, fingerprint: &Fingerprint) -> StoreResult<()>;

    /// Lists every entry, sorted by key.
    fn entries(&self) -> StoreResult<Vec<StoredFingerprint>>;

    /// Number of committed entries.
    fn len(&self) -> StoreResult<usize> {
        Ok(self.entries()?.len())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

/// Opens (or creates) a store of the given kind at `path`.
pub fn open_store(kind: StoreKind, path: &Path) -> StoreResult<Box<dyn FingerprintStore>> {
    Ok(match kind {
        StoreKind::Json => Box::new(JsonFileStore::open(path)?),
        StoreKind::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}
