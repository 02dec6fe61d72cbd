//! Cloud delivery with per-domain batching.
//!
//! Customers go out in a single request. Inventory is split into
//! fixed-size batches because the endpoint caps payload size; batches are
//! sent in order and delivery stops at the first rejected batch. The
//! remote side treats batches as a set union, so order only matters for
//! progress reporting.
//!
//! Every request carries `X-Batch-Index`, `X-Batch-Count` and an
//! `Idempotency-Key` derived from the record set's fingerprint, which lets
//! the receiver recognise batches it already applied when a failed
//! delivery is retried in full on the next run.

use crate::error::{SyncError, SyncResult};
use crate::fetcher::truncate;
use async_trait::async_trait;
use ledgerbridge_types::{Company, Customer, Domain, Fingerprint, InventoryItem, RecordSet};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const BATCH_INDEX_HEADER: &str = "X-Batch-Index";
pub const BATCH_COUNT_HEADER: &str = "X-Batch-Count";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// How a domain's record set is split into requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// One request with every record.
    Whole,
    /// Requests of at most this many records.
    Chunked(usize),
}

impl BatchPolicy {
    /// Number of requests needed for `len` records.
    pub fn batch_count(&self, len: usize) -> usize {
        match self {
            BatchPolicy::Whole => 1,
            BatchPolicy::Chunked(size) => len.div_ceil((*size).max(1)),
        }
    }

    fn split<'a, T>(&self, records: &'a [T]) -> Vec<&'a [T]> {
        match self {
            BatchPolicy::Whole => vec![records],
            BatchPolicy::Chunked(size) => records.chunks((*size).max(1)).collect(),
        }
    }
}

/// Outcome of a fully successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub records: usize,
    pub batches: usize,
}

/// Pushes a record set to the cloud.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Delivers the whole record set. Succeeds only if every batch was
    /// accepted.
    async fn deliver(
        &self,
        company: &Company,
        records: &RecordSet,
        fingerprint: &Fingerprint,
    ) -> SyncResult<DeliveryReport>;
}

#[derive(Serialize)]
struct CustomersBody<'a> {
    company: &'a str,
    customers: &'a [Customer],
}

#[derive(Serialize)]
struct InventoryBody<'a> {
    company: &'a str,
    items: &'a [InventoryItem],
}

/// Delivery over HTTPS JSON endpoints.
pub struct HttpDelivery {
    client: Client,
    customers_url: String,
    inventory_url: String,
    inventory_batch_size: usize,
}

impl HttpDelivery {
    /// Creates a delivery client. Every request is bounded by `timeout`.
    pub fn new(
        customers_url: impl Into<String>,
        inventory_url: impl Into<String>,
        inventory_batch_size: usize,
        timeout: Duration,
    ) -> SyncResult<Self> {
        if inventory_batch_size == 0 {
            return Err(SyncError::Config("inventory batch size must be > 0".into()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            customers_url: customers_url.into(),
            inventory_url: inventory_url.into(),
            inventory_batch_size,
        })
    }

    /// The batching policy applied to a domain.
    pub fn policy_for(&self, domain: Domain) -> BatchPolicy {
        match domain {
            Domain::Customers => BatchPolicy::Whole,
            Domain::Inventory => BatchPolicy::Chunked(self.inventory_batch_size),
        }
    }

    async fn post_batch<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        progress: BatchProgress<'_>,
    ) -> SyncResult<()> {
        let response = self
            .client
            .post(url)
            .header(BATCH_INDEX_HEADER, progress.index.to_string())
            .header(BATCH_COUNT_HEADER, progress.total.to_string())
            .header(
                IDEMPOTENCY_KEY_HEADER,
                format!("{}-{}", progress.fingerprint, progress.index),
            )
            .json(body)
            .send()
            .await
            .map_err(|e| progress.fail(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(progress.fail(format!("HTTP {status}: {}", truncate(&text, 512))));
        }
        Ok(())
    }

    async fn send_all<'a, T: Sync, B: Serialize + Sync>(
        &self,
        url: &str,
        records: &'a [T],
        policy: BatchPolicy,
        fingerprint: &Fingerprint,
        make_body: impl Fn(&'a [T]) -> B,
    ) -> SyncResult<DeliveryReport> {
        let batches = policy.split(records);
        let total = batches.len();
        let mut delivered = 0;

        for (i, batch) in batches.into_iter().enumerate() {
            let progress = BatchProgress {
                index: i + 1,
                total,
                delivered,
                fingerprint,
            };
            self.post_batch(url, &make_body(batch), progress).await?;
            delivered += batch.len();
            debug!("Batch {}/{} accepted ({} records)", i + 1, total, batch.len());
        }

        Ok(DeliveryReport {
            records: delivered,
            batches: total,
        })
    }
}

#[derive(Clone, Copy)]
struct BatchProgress<'a> {
    index: usize,
    total: usize,
    delivered: usize,
    fingerprint: &'a Fingerprint,
}

impl BatchProgress<'_> {
    fn fail(&self, reason: String) -> SyncError {
        SyncError::Delivery {
            batch: self.index,
            total: self.total,
            delivered: self.delivered,
            reason,
        }
    }
}

#[async_trait]
impl Delivery for HttpDelivery {
    async fn deliver(
        &self,
        company: &Company,
        records: &RecordSet,
        fingerprint: &Fingerprint,
    ) -> SyncResult<DeliveryReport> {
        let policy = self.policy_for(records.domain());
        let name = company.external_name.as_str();

        let report = match records {
            RecordSet::Customers(customers) => {
                self.send_all(&self.customers_url, customers, policy, fingerprint, |batch| {
                    CustomersBody {
                        company: name,
                        customers: batch,
                    }
                })
                .await?
            }
            RecordSet::Inventory(items) => {
                self.send_all(&self.inventory_url, items, policy, fingerprint, |batch| {
                    InventoryBody {
                        company: name,
                        items: batch,
                    }
                })
                .await?
            }
        };

        info!(
            "Delivered {} {} records for {} in {} batches",
            report.records,
            records.domain(),
            company,
            report.batches
        );
        Ok(report)
    }
}
