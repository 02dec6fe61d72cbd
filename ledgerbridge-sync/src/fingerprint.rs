//! Content fingerprinting.
//!
//! The canonical form of a record set is its compact JSON serialization:
//! record fields in declaration order, extra inventory fields key-sorted,
//! no whitespace. The JSON is streamed straight into SHA-256 without
//! being buffered.

use crate::error::SyncResult;
use ledgerbridge_types::{Fingerprint, RecordSet};
use sha2::{Digest, Sha256};

/// Computes the fingerprint of a record set.
///
/// Pure: equal content always yields an equal fingerprint, regardless of
/// which instances hold it. Only the record array is hashed, not the
/// domain tag.
pub fn fingerprint(records: &RecordSet) -> SyncResult<Fingerprint> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, records)?;
    Ok(Fingerprint::from_digest(hasher.finalize().into()))
}

/// Returns the exact bytes that [`fingerprint`] hashes.
pub fn canonical_bytes(records: &RecordSet) -> SyncResult<Vec<u8>> {
    Ok(serde_json::to_vec(records)?)
}
