//! Snapshot-file fingerprint store.
//!
//! The file is a flat JSON object keyed `"{company}_{domain}"`, the same
//! layout the legacy `hashStore.json` used, so an existing file can be
//! adopted as-is.

use crate::{FingerprintKey, FingerprintStore, StoreError, StoreResult, StoredFingerprint};
use ledgerbridge_types::Fingerprint;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Fingerprint store backed by a single JSON file.
///
/// The whole map is held in memory and every `set` rewrites the full
/// snapshot to a sibling temp file, fsyncs it and renames it over the
/// target. The in-memory map only changes once the rename succeeded, so a
/// failed write leaves both the file and the map at their previous state.
pub struct JsonFileStore {
    path: PathBuf,
    /// Raw entries. Keys that do not parse are kept and written back.
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the snapshot at `path`, creating an empty one if absent.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str::<BTreeMap<String, String>>(&contents)?
            }
        } else {
            if let Some(parent) = non_empty_parent(&path) {
                fs::create_dir_all(parent)?;
            }
            let empty = BTreeMap::new();
            write_snapshot(&path, &empty)?;
            info!("Created fingerprint store at {:?}", path);
            empty
        };

        for key in entries.keys() {
            if FingerprintKey::parse_flat(key).is_none() {
                warn!("Ignoring unrecognised fingerprint key {:?} in {:?}", key, path);
            }
        }

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FingerprintStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn get(&self, key: &FingerprintKey) -> StoreResult<Option<Fingerprint>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        entries
            .get(&key.to_string())
            .map(|raw| {
                raw.parse()
                    .map_err(|e| StoreError::InvalidData(format!("{key}: {e}")))
            })
            .transpose()
    }

    fn set(&self, key: &FingerprintKey, fingerprint: &Fingerprint) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;

        let mut next = entries.clone();
        next.insert(key.to_string(), fingerprint.to_string());
        write_snapshot(&self.path, &next)?;
        *entries = next;

        debug!("Committed fingerprint {} for {}", fingerprint.short(12), key);
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<StoredFingerprint>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        let mut result = Vec::with_capacity(entries.len());
        for (raw_key, raw_fp) in entries.iter() {
            let Some(key) = FingerprintKey::parse_flat(raw_key) else {
                continue;
            };
            let fingerprint = raw_fp
                .parse()
                .map_err(|e| StoreError::InvalidData(format!("{raw_key}: {e}")))?;
            result.push(StoredFingerprint { key, fingerprint });
        }
        result.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(result)
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Writes `entries` to a temp file next to `path`, then renames it into
/// place.
fn write_snapshot(path: &Path, entries: &BTreeMap<String, String>) -> StoreResult<()> {
    let dir = non_empty_parent(path).unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, entries)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
