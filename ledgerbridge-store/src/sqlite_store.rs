//! SQLite-backed fingerprint store.
//!
//! Writes are per key, so a failed write can only ever affect the row it
//! targeted.

use crate::{FingerprintKey, FingerprintStore, StoreError, StoreResult, StoredFingerprint};
use ledgerbridge_types::{Domain, Fingerprint};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Persistent fingerprint store backed by SQLite.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        info!("Opened SQLite fingerprint store at {:?}", path);
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS fingerprints (
                company TEXT NOT NULL,
                domain TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (company, domain)
            );
            ",
        )?;
        Ok(())
    }

    /// Returns when a key was last committed, in milliseconds since the
    /// Unix epoch.
    pub fn updated_at(&self, key: &FingerprintKey) -> StoreResult<Option<u64>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM fingerprints WHERE company = ?1 AND domain = ?2",
                params![key.company, key.domain.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| {
            s.parse::<u64>()
                .map_err(|e| StoreError::InvalidData(format!("updated_at for {key}: {e}")))
        })
        .transpose()
    }
}

impl FingerprintStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, key: &FingerprintKey) -> StoreResult<Option<Fingerprint>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT fingerprint FROM fingerprints WHERE company = ?1 AND domain = ?2",
                params![key.company, key.domain.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| {
            s.parse()
                .map_err(|e| StoreError::InvalidData(format!("{key}: {e}")))
        })
        .transpose()
    }

    fn set(&self, key: &FingerprintKey, fingerprint: &Fingerprint) -> StoreResult<()> {
        let conn = self.lock()?;
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();
        conn.execute(
            "INSERT INTO fingerprints (company, domain, fingerprint, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(company, domain)
             DO UPDATE SET fingerprint = excluded.fingerprint, updated_at = excluded.updated_at",
            params![key.company, key.domain.as_str(), fingerprint.as_str(), ts],
        )?;
        debug!("Committed fingerprint {} for {}", fingerprint.short(12), key);
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<StoredFingerprint>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT company, domain, fingerprint FROM fingerprints ORDER BY company, domain",
        )?;
        let rows = stmt.query_map([], |row| {
            let company: String = row.get(0)?;
            let domain: String = row.get(1)?;
            let fingerprint: String = row.get(2)?;
            Ok((company, domain, fingerprint))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (company, domain_str, fp_str) = row?;
            let domain: Domain = domain_str
                .parse()
                .map_err(|e| StoreError::InvalidData(format!("{e}")))?;
            let fingerprint: Fingerprint = fp_str
                .parse()
                .map_err(|e| StoreError::InvalidData(format!("{company}_{domain}: {e}")))?;
            result.push(StoredFingerprint {
                key: FingerprintKey::new(company, domain),
                fingerprint,
            });
        }
        result.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(result)
    }

    fn len(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
