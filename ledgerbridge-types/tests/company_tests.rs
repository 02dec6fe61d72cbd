use ledgerbridge_types::{Company, Domain, Fingerprint};
use proptest::prelude::*;

// ── Company ──────────────────────────────────────────────────────

#[test]
fn company_display_is_external_name() {
    let c = Company::new("FANCY-PALACE-TRADING-LLC - (from 1-Jan-25)", "FANCY PALACE TRADING LLC");
    assert_eq!(c.to_string(), "FANCY PALACE TRADING LLC");
}

#[test]
fn company_serde_field_names() {
    let c = Company::new("internal", "external");
    let value = serde_json::to_value(&c).unwrap();
    assert_eq!(value["internal_name"], "internal");
    assert_eq!(value["external_name"], "external");
}

// ── Domain ───────────────────────────────────────────────────────

#[test]
fn domain_order_is_customers_then_inventory() {
    assert_eq!(Domain::ALL, [Domain::Customers, Domain::Inventory]);
}

#[test]
fn domain_display_and_parse() {
    for domain in Domain::ALL {
        let parsed: Domain = domain.to_string().parse().unwrap();
        assert_eq!(parsed, domain);
    }
    assert!("ledgers".parse::<Domain>().is_err());
}

#[test]
fn domain_serde_lowercase() {
    assert_eq!(serde_json::to_string(&Domain::Inventory).unwrap(), "\"inventory\"");
    let d: Domain = serde_json::from_str("\"customers\"").unwrap();
    assert_eq!(d, Domain::Customers);
}

// ── Fingerprint ──────────────────────────────────────────────────

#[test]
fn fingerprint_from_digest_is_hex() {
    let fp = Fingerprint::from_digest([0xab; 32]);
    assert_eq!(fp.as_str().len(), 64);
    assert!(fp.as_str().starts_with("abab"));
    assert_eq!(fp.short(8), "abababab");
}

#[test]
fn fingerprint_parse_rejects_bad_input() {
    assert!("".parse::<Fingerprint>().is_err());
    assert!("abc".parse::<Fingerprint>().is_err());
    assert!("Z".repeat(64).parse::<Fingerprint>().is_err());
    assert!("AB".repeat(32).parse::<Fingerprint>().is_err());
}

#[test]
fn fingerprint_serde_validates() {
    let ok: Result<Fingerprint, _> = serde_json::from_str(&format!("\"{}\"", "0f".repeat(32)));
    assert!(ok.is_ok());
    let bad: Result<Fingerprint, _> = serde_json::from_str("\"nope\"");
    assert!(bad.is_err());
}

proptest! {
    #[test]
    fn fingerprint_display_parse_roundtrip(bytes in any::<[u8; 32]>()) {
        let fp = Fingerprint::from_digest(bytes);
        let parsed: Fingerprint = fp.to_string().parse().unwrap();
        prop_assert_eq!(parsed, fp);
    }
}
