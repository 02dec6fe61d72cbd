use ledgerbridge_store::{
    FingerprintKey, FingerprintStore, SqliteStore, StoreKind, open_store,
};
use ledgerbridge_types::{Domain, Fingerprint};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn fp(byte: u8) -> Fingerprint {
    Fingerprint::from_digest([byte; 32])
}

// ── Basic operations ─────────────────────────────────────────────

#[test]
fn empty_store() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.backend_name(), "sqlite");
    assert!(store.is_empty().unwrap());
    assert_eq!(
        store.get(&FingerprintKey::new("ACME", Domain::Customers)).unwrap(),
        None
    );
}

#[test]
fn upsert_replaces_value() {
    let store = SqliteStore::open_in_memory().unwrap();
    let key = FingerprintKey::new("ACME", Domain::Inventory);

    store.set(&key, &fp(1)).unwrap();
    store.set(&key, &fp(2)).unwrap();

    assert_eq!(store.get(&key).unwrap(), Some(fp(2)));
    assert_eq!(store.len().unwrap(), 1);
    assert!(store.updated_at(&key).unwrap().is_some());
}

#[test]
fn updated_at_absent_for_unknown_key() {
    let store = SqliteStore::open_in_memory().unwrap();
    let key = FingerprintKey::new("ACME", Domain::Inventory);
    assert_eq!(store.updated_at(&key).unwrap(), None);
}

#[test]
fn entries_list_all_keys() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set(&FingerprintKey::new("B", Domain::Customers), &fp(1)).unwrap();
    store.set(&FingerprintKey::new("A", Domain::Inventory), &fp(2)).unwrap();
    store.set(&FingerprintKey::new("A", Domain::Customers), &fp(3)).unwrap();

    let entries = store.entries().unwrap();
    let keys: Vec<String> = entries.iter().map(|e| e.key.to_string()).collect();
    assert_eq!(keys, vec!["A_customers", "A_inventory", "B_customers"]);
    assert_eq!(entries[0].fingerprint, fp(3));
}

#[test]
fn persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fingerprints.db");
    let key = FingerprintKey::new("ACME", Domain::Customers);

    {
        let store = SqliteStore::open(&path).unwrap();
        store.set(&key, &fp(7)).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.get(&key).unwrap(), Some(fp(7)));
}

#[test]
fn concurrent_readers() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let key = FingerprintKey::new("ACME", Domain::Customers);
    store.set(&key, &fp(5)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let key = key.clone();
            std::thread::spawn(move || store.get(&key).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(fp(5)));
    }
}

// ── open_store ───────────────────────────────────────────────────

#[test]
fn open_store_by_kind() {
    let dir = TempDir::new().unwrap();

    let json = open_store(StoreKind::Json, &dir.path().join("a.json")).unwrap();
    assert_eq!(json.backend_name(), "json");

    let sqlite = open_store(StoreKind::Sqlite, &dir.path().join("a.db")).unwrap();
    assert_eq!(sqlite.backend_name(), "sqlite");
}

#[test]
fn store_kind_serde() {
    assert_eq!(serde_json::to_string(&StoreKind::Sqlite).unwrap(), "\"sqlite\"");
    let kind: StoreKind = serde_json::from_str("\"json\"").unwrap();
    assert_eq!(kind, StoreKind::Json);
    assert_eq!(StoreKind::default(), StoreKind::Json);
}
