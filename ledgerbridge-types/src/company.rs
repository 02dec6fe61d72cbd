//! Companies and synced data domains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A company configured for sync.
///
/// The ERP knows the company by `internal_name` (often with a financial
/// period suffix); the cloud side knows it by `external_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Company {
    /// Name used when querying the ERP agent.
    pub internal_name: String,
    /// Name sent to the cloud endpoints and used in the fingerprint key.
    pub external_name: String,
}

impl Company {
    /// Creates a company identity pair.
    pub fn new(internal_name: impl Into<String>, external_name: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
            external_name: external_name.into(),
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.external_name)
    }
}

/// One of the two synced data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Customers,
    Inventory,
}

impl Domain {
    /// Every domain, in per-company sync order.
    pub const ALL: [Domain; 2] = [Domain::Customers, Domain::Inventory];

    /// Returns the wire name of the domain.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::Customers => "customers",
            Domain::Inventory => "inventory",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customers" => Ok(Domain::Customers),
            "inventory" => Ok(Domain::Inventory),
            other => Err(crate::Error::UnknownDomain(other.to_string())),
        }
    }
}
