use ledgerbridge_sync::fingerprint::{canonical_bytes, fingerprint};
use ledgerbridge_types::{Customer, InventoryItem, RecordSet};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn customer(name: &str, balance: &str) -> Customer {
    Customer {
        name: name.into(),
        trn: "100200300".into(),
        group: "Sundry Debtors".into(),
        balance: balance.into(),
        address: vec!["Line 1".into(), "Line 2".into()],
    }
}

// ── Canonical form ──────────────────────────────────────────────

#[test]
fn canonical_bytes_are_compact_record_array() {
    let records = RecordSet::Customers(vec![customer("Acme", "10")]);
    let bytes = canonical_bytes(&records).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        r#"[{"name":"Acme","trn":"100200300","group":"Sundry Debtors","balance":"10","address":["Line 1","Line 2"]}]"#
    );
}

#[test]
fn fingerprint_is_sha256_of_canonical_bytes() {
    // SHA-256 of "[]"
    let fp = fingerprint(&RecordSet::Customers(Vec::new())).unwrap();
    assert_eq!(
        fp.as_str(),
        "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
    );
}

#[test]
fn empty_sets_of_either_domain_hash_alike() {
    let customers = fingerprint(&RecordSet::Customers(Vec::new())).unwrap();
    let inventory = fingerprint(&RecordSet::Inventory(Vec::new())).unwrap();
    assert_eq!(customers, inventory);
}

#[test]
fn extra_field_insertion_order_does_not_matter() {
    let a: InventoryItem =
        serde_json::from_value(json!({"NAME": "Pipe", "ZETA": 1, "ALPHA": 2})).unwrap();
    let b: InventoryItem =
        serde_json::from_value(json!({"ALPHA": 2, "NAME": "Pipe", "ZETA": 1})).unwrap();

    assert_eq!(
        fingerprint(&RecordSet::Inventory(vec![a])).unwrap(),
        fingerprint(&RecordSet::Inventory(vec![b])).unwrap()
    );
}

#[test]
fn scalar_and_single_element_address_hash_alike() {
    let scalar: Customer =
        serde_json::from_value(json!({"name": "Acme", "address": "Main St"})).unwrap();
    let list: Customer =
        serde_json::from_value(json!({"name": "Acme", "address": ["Main St"]})).unwrap();

    assert_eq!(
        fingerprint(&RecordSet::Customers(vec![scalar])).unwrap(),
        fingerprint(&RecordSet::Customers(vec![list])).unwrap()
    );
}

// ── Sensitivity ─────────────────────────────────────────────────

#[test]
fn single_field_change_changes_fingerprint() {
    let before = RecordSet::Customers(vec![customer("Acme", "100.00")]);
    let after = RecordSet::Customers(vec![customer("Acme", "100.01")]);
    assert_ne!(fingerprint(&before).unwrap(), fingerprint(&after).unwrap());
}

#[test]
fn record_order_changes_fingerprint() {
    let ab = RecordSet::Inventory(vec![InventoryItem::named("A"), InventoryItem::named("B")]);
    let ba = RecordSet::Inventory(vec![InventoryItem::named("B"), InventoryItem::named("A")]);
    assert_ne!(fingerprint(&ab).unwrap(), fingerprint(&ba).unwrap());
}

// ── Properties ──────────────────────────────────────────────────

fn arb_customer() -> impl Strategy<Value = Customer> {
    (
        "[A-Za-z ]{1,16}",
        "[0-9]{0,15}",
        "[A-Za-z ]{0,12}",
        "-?[0-9]{1,6}\\.[0-9]{2}",
        prop::collection::vec("[A-Za-z0-9 ,]{0,20}", 0..3),
    )
        .prop_map(|(name, trn, group, balance, address)| Customer {
            name,
            trn,
            group,
            balance,
            address,
        })
}

proptest! {
    #[test]
    fn equal_content_yields_equal_fingerprint(records in prop::collection::vec(arb_customer(), 0..20)) {
        let a = RecordSet::Customers(records.clone());
        let b = RecordSet::Customers(records);
        prop_assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn fingerprint_is_64_lowercase_hex(records in prop::collection::vec(arb_customer(), 0..5)) {
        let fp = fingerprint(&RecordSet::Customers(records)).unwrap();
        prop_assert_eq!(fp.as_str().len(), 64);
        prop_assert!(fp.as_str().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn changed_balance_yields_different_fingerprint(
        records in prop::collection::vec(arb_customer(), 1..10),
        idx in any::<prop::sample::Index>(),
    ) {
        let original = RecordSet::Customers(records.clone());
        let mut modified = records;
        let i = idx.index(modified.len());
        modified[i].balance.push('9');
        let modified = RecordSet::Customers(modified);
        prop_assert_ne!(fingerprint(&original).unwrap(), fingerprint(&modified).unwrap());
    }
}
