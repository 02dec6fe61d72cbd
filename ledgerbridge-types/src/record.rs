//! Customer and inventory records.
//!
//! Records arrive from the ERP agent as loosely typed JSON: numbers where
//! strings are expected, a scalar where a list is expected, placeholder
//! names for deleted stock items. The deserializers here absorb those
//! irregularities so that every record reaching the sync core has one
//! fixed shape.
//!
//! Serialization is canonical: struct fields serialize in declaration
//! order and extra inventory fields live in a `BTreeMap`, so equal content
//! always yields byte-identical JSON.

use crate::Domain;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A customer ledger as mapped by the ERP agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Tax registration number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub trn: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub group: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub balance: String,
    /// Address lines. Accepts a single line, a list, or nothing.
    #[serde(default, deserialize_with = "one_or_many")]
    pub address: Vec<String>,
}

/// A stock item as exported by the ERP.
///
/// Known fields keep the ERP's upper-case tag names on the wire so the
/// cloud side receives what the ERP produced. Anything else the agent
/// forwards is retained in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "NAME", alias = "name", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        rename = "PARENT",
        alias = "parent",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,
    #[serde(
        rename = "CATEGORY",
        alias = "category",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(
        rename = "BASEUNITS",
        alias = "base_units",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_units: Option<String>,
    #[serde(
        rename = "OPENINGBALANCE",
        alias = "opening_balance",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_balance: Option<String>,
    #[serde(
        rename = "CLOSINGBALANCE",
        alias = "closing_balance",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub closing_balance: Option<String>,
    #[serde(
        rename = "CLOSINGVALUE",
        alias = "closing_value",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub closing_value: Option<String>,
    /// Remaining agent-supplied fields, key-sorted.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl InventoryItem {
    /// Creates an item with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether this item should be synced at all.
    pub fn is_valid(&self) -> bool {
        is_valid_inventory_name(&self.name)
    }
}

/// Rejects blank names, the `"0"` placeholder, and names still carrying
/// encoded character entities (`&#...;`), which the ERP emits for items
/// that were deleted or never completed.
pub fn is_valid_inventory_name(name: &str) -> bool {
    !(name.trim().is_empty() || name == "0" || name.contains("&#"))
}

/// The full record set of one domain for one company, as fetched.
///
/// Serializes as the bare record array, which is exactly what gets
/// fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordSet {
    Customers(Vec<Customer>),
    Inventory(Vec<InventoryItem>),
}

impl RecordSet {
    /// Creates an empty record set for a domain.
    pub fn empty(domain: Domain) -> Self {
        match domain {
            Domain::Customers => RecordSet::Customers(Vec::new()),
            Domain::Inventory => RecordSet::Inventory(Vec::new()),
        }
    }

    /// The domain these records belong to.
    pub fn domain(&self) -> Domain {
        match self {
            RecordSet::Customers(_) => Domain::Customers,
            RecordSet::Inventory(_) => Domain::Inventory,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Customers(records) => records.len(),
            RecordSet::Inventory(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers, booleans and null. Numbers keep their JSON
/// spelling, so a numeric `0` becomes `"0"`.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(line)) if line.is_empty() => Vec::new(),
        Some(OneOrMany::One(line)) => vec![line],
        Some(OneOrMany::Many(lines)) => lines,
    })
}
