//! Record fetching from the local ERP agent.
//!
//! The agent exposes one JSON endpoint per domain and company:
//! `GET {base}/fetch-customers/{company}` returning
//! `{ "company": ..., "customers": [...] }`, and
//! `GET {base}/fetch-inventory/{company}` returning
//! `{ "company": ..., "items": [...] }`.
//!
//! The ERP sometimes collapses a one-element list into a bare object, and
//! keeps placeholder stock items around. Both are normalized here so the
//! sync core only ever sees a clean, ordered record list.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use ledgerbridge_types::{Company, Customer, Domain, InventoryItem, RecordSet};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

/// Source of record sets, one call per (company, domain).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the complete current record set. The returned set's domain
    /// must equal `domain`.
    async fn fetch(&self, company: &Company, domain: Domain) -> SyncResult<RecordSet>;
}

#[derive(Debug, Deserialize)]
struct CustomersResponse {
    #[serde(default, deserialize_with = "one_or_many")]
    customers: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
struct InventoryResponse {
    #[serde(default, deserialize_with = "one_or_many")]
    items: Vec<InventoryItem>,
}

/// HTTP client for the ERP agent.
pub struct AgentFetcher {
    base_url: String,
    client: Client,
}

impl AgentFetcher {
    /// Creates a fetcher. Every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Builds the agent URL for a company and domain.
    pub fn url_for(&self, company: &Company, domain: Domain) -> String {
        format!(
            "{}/fetch-{}/{}",
            self.base_url,
            domain,
            urlencoding::encode(&company.internal_name)
        )
    }
}

#[async_trait]
impl Fetcher for AgentFetcher {
    async fn fetch(&self, company: &Company, domain: Domain) -> SyncResult<RecordSet> {
        let url = self.url_for(company, domain);
        debug!("Fetching {} for {} from {}", domain, company, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Fetch(format!("agent request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Fetch(format!(
                "agent returned {status}: {}",
                truncate(&body, 512)
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Fetch(format!("failed to read agent response: {e}")))?;

        match domain {
            Domain::Customers => {
                let parsed: CustomersResponse = serde_json::from_slice(&body)
                    .map_err(|e| SyncError::Fetch(format!("failed to parse customers: {e}")))?;
                Ok(RecordSet::Customers(clean_customers(parsed.customers)))
            }
            Domain::Inventory => {
                let parsed: InventoryResponse = serde_json::from_slice(&body)
                    .map_err(|e| SyncError::Fetch(format!("failed to parse inventory: {e}")))?;
                Ok(RecordSet::Inventory(clean_inventory(parsed.items)))
            }
        }
    }
}

/// Drops customers without a usable name.
pub fn clean_customers(customers: Vec<Customer>) -> Vec<Customer> {
    let before = customers.len();
    let kept: Vec<Customer> = customers
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .collect();
    if kept.len() != before {
        debug!("Dropped {} unnamed customers", before - kept.len());
    }
    kept
}

/// Drops placeholder stock items.
pub fn clean_inventory(items: Vec<InventoryItem>) -> Vec<InventoryItem> {
    let before = items.len();
    let kept: Vec<InventoryItem> = items.into_iter().filter(InventoryItem::is_valid).collect();
    if kept.len() != before {
        debug!("Dropped {} invalid inventory items", before - kept.len());
    }
    kept
}

pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(all)) => all,
        Some(OneOrMany::One(single)) => vec![single],
    })
}
