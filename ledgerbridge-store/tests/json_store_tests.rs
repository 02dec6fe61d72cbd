use ledgerbridge_store::{FingerprintKey, FingerprintStore, JsonFileStore, StoreError};
use ledgerbridge_types::{Domain, Fingerprint};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

fn fp(byte: u8) -> Fingerprint {
    Fingerprint::from_digest([byte; 32])
}

fn key(company: &str, domain: Domain) -> FingerprintKey {
    FingerprintKey::new(company, domain)
}

// ── Open / create ────────────────────────────────────────────────

#[test]
fn open_creates_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hashStore.json");

    let store = JsonFileStore::open(&path).unwrap();
    assert!(path.exists());
    assert!(store.is_empty().unwrap());
    assert_eq!(store.backend_name(), "json");

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.trim(), "{}");
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("nested").join("fingerprints.json");
    JsonFileStore::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn open_treats_blank_file_as_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hashStore.json");
    fs::write(&path, "  \n").unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn open_rejects_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hashStore.json");
    fs::write(&path, "{ not json").unwrap();

    let result = JsonFileStore::open(&path);
    assert!(matches!(result, Err(StoreError::Serialization(_))));
}

// ── Legacy file compatibility ────────────────────────────────────

#[test]
fn reads_legacy_hash_store_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hashStore.json");
    let legacy = format!(
        r#"{{
  "AMANA-FIRST-TRADING-LLC_customers": "{}",
  "FANCY PALACE TRADING LLC_inventory": "{}"
}}"#,
        fp(1),
        fp(2)
    );
    fs::write(&path, legacy).unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(
        store.get(&key("AMANA-FIRST-TRADING-LLC", Domain::Customers)).unwrap(),
        Some(fp(1))
    );
    assert_eq!(
        store.get(&key("FANCY PALACE TRADING LLC", Domain::Inventory)).unwrap(),
        Some(fp(2))
    );
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn unrecognised_keys_survive_rewrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hashStore.json");
    fs::write(&path, r#"{ "manual-note": "keep me" }"#).unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert!(store.entries().unwrap().is_empty());

    store.set(&key("ACME", Domain::Customers), &fp(3)).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["manual-note"], "keep me");
    assert_eq!(raw["ACME_customers"], fp(3).to_string());
}

#[test]
fn corrupt_fingerprint_value_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hashStore.json");
    fs::write(&path, r#"{ "ACME_customers": "truncated" }"#).unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    let result = store.get(&key("ACME", Domain::Customers));
    assert!(matches!(result, Err(StoreError::InvalidData(_))));
}

// ── get / set ────────────────────────────────────────────────────

#[test]
fn absent_key_is_none() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("s.json")).unwrap();
    assert_eq!(store.get(&key("ACME", Domain::Customers)).unwrap(), None);
}

#[test]
fn set_then_get() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("s.json")).unwrap();
    let k = key("ACME", Domain::Inventory);

    store.set(&k, &fp(9)).unwrap();
    assert_eq!(store.get(&k).unwrap(), Some(fp(9)));

    store.set(&k, &fp(10)).unwrap();
    assert_eq!(store.get(&k).unwrap(), Some(fp(10)));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn domains_are_independent() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("s.json")).unwrap();

    store.set(&key("ACME", Domain::Customers), &fp(1)).unwrap();
    assert_eq!(store.get(&key("ACME", Domain::Inventory)).unwrap(), None);
}

#[test]
fn survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("s.json");
    {
        let store = JsonFileStore::open(&path).unwrap();
        store.set(&key("ACME", Domain::Customers), &fp(4)).unwrap();
        store.set(&key("Globex_Ltd", Domain::Inventory), &fp(5)).unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get(&key("ACME", Domain::Customers)).unwrap(), Some(fp(4)));
    assert_eq!(
        reopened.get(&key("Globex_Ltd", Domain::Inventory)).unwrap(),
        Some(fp(5))
    );
}

#[test]
fn entries_sorted_by_key() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("s.json")).unwrap();
    store.set(&key("Zeta", Domain::Customers), &fp(1)).unwrap();
    store.set(&key("Alpha", Domain::Inventory), &fp(2)).unwrap();
    store.set(&key("Alpha", Domain::Customers), &fp(3)).unwrap();

    let keys: Vec<String> = store
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.key.to_string())
        .collect();
    assert_eq!(keys, vec!["Alpha_customers", "Alpha_inventory", "Zeta_customers"]);
}

#[cfg(unix)]
#[test]
fn failed_write_keeps_previous_state() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");
    fs::create_dir(&state_dir).unwrap();
    let path = state_dir.join("s.json");

    let store = JsonFileStore::open(&path).unwrap();
    let committed = key("ACME", Domain::Customers);
    store.set(&committed, &fp(1)).unwrap();

    // Read-only directory: the temp file cannot be created.
    fs::set_permissions(&state_dir, fs::Permissions::from_mode(0o555)).unwrap();
    let probe = state_dir.join("probe");
    let writable = fs::write(&probe, b"x").is_ok();
    let result = store.set(&key("ACME", Domain::Inventory), &fp(2));
    fs::set_permissions(&state_dir, fs::Permissions::from_mode(0o755)).unwrap();

    if writable {
        // Running with privileges that ignore directory permissions.
        return;
    }

    assert!(result.is_err());
    assert_eq!(store.get(&committed).unwrap(), Some(fp(1)));
    assert_eq!(store.get(&key("ACME", Domain::Inventory)).unwrap(), None);

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get(&committed).unwrap(), Some(fp(1)));
    assert_eq!(reopened.len().unwrap(), 1);
}

// ── FingerprintKey ───────────────────────────────────────────────

#[test]
fn flat_key_roundtrip() {
    let k = key("FANCY PALACE TRADING LLC", Domain::Inventory);
    assert_eq!(k.to_string(), "FANCY PALACE TRADING LLC_inventory");
    assert_eq!(FingerprintKey::parse_flat(&k.to_string()), Some(k));
}

#[test]
fn flat_key_with_underscored_company() {
    let parsed = FingerprintKey::parse_flat("A_B_C_customers").unwrap();
    assert_eq!(parsed.company, "A_B_C");
    assert_eq!(parsed.domain, Domain::Customers);
}

#[test]
fn flat_key_rejects_garbage() {
    assert_eq!(FingerprintKey::parse_flat("nounderscore"), None);
    assert_eq!(FingerprintKey::parse_flat("_customers"), None);
    assert_eq!(FingerprintKey::parse_flat("ACME_ledgers"), None);
}
