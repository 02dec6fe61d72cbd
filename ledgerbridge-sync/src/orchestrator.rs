//! Sync orchestrator. Drives every (company, domain) unit of work.
//!
//! A run visits companies in configured order and, for each, the domains
//! in [`Domain::ALL`] order. Units run one after another; each goes
//! through fetch → hash → compare → (skip | deliver → commit) and emits
//! an audit event at every transition. A failure ends only its own unit.
//!
//! The stored fingerprint is written only after a delivery fully
//! succeeded, so any failure leaves the store as it was and the next run
//! retries the whole record set.

use crate::audit::{AuditSink, FanoutAuditSink, HttpAuditSink, TracingAuditSink};
use crate::config::SyncConfig;
use crate::delivery::{Delivery, HttpDelivery};
use crate::error::{SyncError, SyncResult};
use crate::fetcher::{AgentFetcher, Fetcher};
use crate::fingerprint::fingerprint;
use chrono::{DateTime, Utc};
use ledgerbridge_store::{FingerprintKey, FingerprintStore, open_store};
use ledgerbridge_types::{
    AuditEvent, AuditSource, AuditStage, AuditStatus, Company, Domain, Fingerprint,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// How a single unit of work ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Content changed, was delivered in full, and the fingerprint was
    /// committed.
    Delivered {
        records: usize,
        batches: usize,
        fingerprint: Fingerprint,
    },
    /// Content matched the stored fingerprint; nothing was sent.
    Unchanged { fingerprint: Fingerprint },
    /// The agent returned zero records; treated as suspicious and not
    /// synced.
    EmptyResult,
    FetchFailed { error: String },
    HashFailed { error: String },
    /// The stored fingerprint could not be read.
    StoreFailed { error: String },
    DeliveryFailed { error: String },
    /// Delivery succeeded but the fingerprint could not be written; the
    /// next run delivers again.
    CommitFailed { error: String },
}

impl UnitOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            UnitOutcome::Delivered { .. } | UnitOutcome::Unchanged { .. }
        )
    }
}

/// One unit's entry in a run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    /// External company name.
    pub company: String,
    pub domain: Domain,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
}

/// Summary of one complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub source: AuditSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn delivered(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Delivered { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Unchanged { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(UnitOutcome::is_failure)
    }

    fn count(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.outcome)).count()
    }
}

/// Clears the in-progress flag when dropped, including on cancellation.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Audit context shared by every event of one unit.
struct UnitContext<'a> {
    company: &'a Company,
    domain: Domain,
    source: AuditSource,
}

impl UnitContext<'_> {
    fn event(&self, stage: AuditStage, status: AuditStatus, message: String) -> AuditEvent {
        AuditEvent::new(
            self.company,
            self.domain,
            self.source,
            stage,
            status,
            message,
        )
    }
}

/// Runs the fetch → fingerprint → deliver pipeline for every configured
/// company and domain.
pub struct SyncOrchestrator {
    companies: Vec<Company>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn FingerprintStore>,
    delivery: Arc<dyn Delivery>,
    audit: Arc<dyn AuditSink>,
    running: AtomicBool,
    last_report: RwLock<Option<RunReport>>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator from its collaborators.
    pub fn new(
        companies: Vec<Company>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn FingerprintStore>,
        delivery: Arc<dyn Delivery>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            companies,
            fetcher,
            store,
            delivery,
            audit,
            running: AtomicBool::new(false),
            last_report: RwLock::new(None),
        }
    }

    /// Wires the HTTP collaborators and the configured store.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        config.validate()?;

        let fetcher = AgentFetcher::new(config.agent.base_url.clone(), config.agent_timeout())?;
        let delivery = HttpDelivery::new(
            config.endpoints.customers.clone(),
            config.endpoints.inventory.clone(),
            config.delivery.inventory_batch_size,
            config.endpoint_timeout(),
        )?;
        let store: Arc<dyn FingerprintStore> =
            Arc::from(open_store(config.store.kind, &config.store.path)?);

        let audit: Arc<dyn AuditSink> = match &config.endpoints.audit {
            Some(url) => {
                let sinks: Vec<Arc<dyn AuditSink>> = vec![
                    Arc::new(TracingAuditSink),
                    Arc::new(HttpAuditSink::new(url.clone(), config.endpoint_timeout())?),
                ];
                Arc::new(FanoutAuditSink::new(sinks))
            }
            None => Arc::new(TracingAuditSink),
        };

        Ok(Self::new(
            config.companies.clone(),
            Arc::new(fetcher),
            store,
            Arc::new(delivery),
            audit,
        ))
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// The fingerprint store in use.
    pub fn store(&self) -> &Arc<dyn FingerprintStore> {
        &self.store
    }

    /// Whether a run currently holds the in-progress guard.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Report of the most recently completed run.
    pub async fn last_report(&self) -> Option<RunReport> {
        self.last_report.read().await.clone()
    }

    /// Performs one full run over every company and domain.
    ///
    /// Returns [`SyncError::RunInProgress`] without doing anything if
    /// another run has not finished yet. Unit failures do not fail the
    /// run; they are recorded in the report.
    pub async fn run(&self, source: AuditSource) -> SyncResult<RunReport> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            return Err(SyncError::RunInProgress);
        };

        let started_at = Utc::now();
        info!("Sync run started ({source}, {} companies)", self.companies.len());

        let mut units = Vec::with_capacity(self.companies.len() * Domain::ALL.len());
        for company in &self.companies {
            for domain in Domain::ALL {
                let outcome = self.sync_unit(company, domain, source).await;
                units.push(UnitReport {
                    company: company.external_name.clone(),
                    domain,
                    outcome,
                });
            }
        }

        let report = RunReport {
            source,
            started_at,
            finished_at: Utc::now(),
            units,
        };
        info!(
            "Sync run finished: {} delivered, {} unchanged, {} failed",
            report.delivered(),
            report.unchanged(),
            report.failed()
        );

        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }

    async fn sync_unit(&self, company: &Company, domain: Domain, source: AuditSource) -> UnitOutcome {
        let ctx = UnitContext {
            company,
            domain,
            source,
        };

        // ── Fetch ────────────────────────────────────────────────
        let fetched = self.fetcher.fetch(company, domain).await.and_then(|records| {
            if records.domain() == domain {
                Ok(records)
            } else {
                Err(SyncError::Fetch(format!(
                    "fetcher returned {} records for {domain}",
                    records.domain()
                )))
            }
        });
        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                warn!("Fetch of {domain} for {company} failed: {e}");
                self.emit(
                    ctx.event(
                        AuditStage::Fetch,
                        AuditStatus::Error,
                        format!("Failed to fetch {domain} from ERP"),
                    )
                    .with_details(json!({ "error": e.to_string() })),
                )
                .await;
                return UnitOutcome::FetchFailed {
                    error: e.to_string(),
                };
            }
        };

        self.emit(
            ctx.event(
                AuditStage::Fetch,
                AuditStatus::Success,
                format!("{domain} fetched successfully from ERP"),
            )
            .with_details(json!({ "count": records.len() })),
        )
        .await;

        if records.is_empty() {
            warn!("Fetch of {domain} for {company} returned no records, not syncing");
            self.emit(
                ctx.event(
                    AuditStage::Fetch,
                    AuditStatus::Error,
                    format!("{domain} fetch returned an empty result, sync refused"),
                )
                .with_details(json!({ "count": 0, "error": SyncError::EmptyResult.to_string() })),
            )
            .await;
            return UnitOutcome::EmptyResult;
        }

        // ── Hash ─────────────────────────────────────────────────
        let new_fp = match fingerprint(&records) {
            Ok(fp) => fp,
            Err(e) => {
                warn!("Fingerprinting {domain} for {company} failed: {e}");
                self.emit(
                    ctx.event(
                        AuditStage::Hash,
                        AuditStatus::Error,
                        format!("Failed to fingerprint {domain}"),
                    )
                    .with_details(json!({ "error": e.to_string() })),
                )
                .await;
                return UnitOutcome::HashFailed {
                    error: e.to_string(),
                };
            }
        };

        let key = FingerprintKey::for_company(company, domain);
        let old_fp = match self.store.get(&key) {
            Ok(old) => old,
            Err(e) => {
                let e = SyncError::from(e);
                warn!("Reading stored fingerprint for {key} failed: {e}");
                self.emit(
                    ctx.event(
                        AuditStage::Hash,
                        AuditStatus::Error,
                        format!("Failed to read stored {domain} fingerprint"),
                    )
                    .with_details(json!({ "error": e.to_string(), "newHash": new_fp })),
                )
                .await;
                return UnitOutcome::StoreFailed {
                    error: e.to_string(),
                };
            }
        };

        let changed = old_fp.as_ref() != Some(&new_fp);
        self.emit(
            ctx.event(
                AuditStage::Hash,
                AuditStatus::Success,
                format!("{domain} hash calculated"),
            )
            .with_details(json!({
                "oldHash": old_fp,
                "newHash": new_fp,
                "changed": changed,
            })),
        )
        .await;

        if !changed {
            info!("{domain} for {company} unchanged ({}), skipping", new_fp.short(12));
            self.emit(
                ctx.event(
                    AuditStage::Hash,
                    AuditStatus::Success,
                    format!("{domain} unchanged, sync skipped"),
                )
                .with_details(json!({ "hash": new_fp, "skipped": true })),
            )
            .await;
            return UnitOutcome::Unchanged { fingerprint: new_fp };
        }

        // ── Deliver ──────────────────────────────────────────────
        let report = match self.delivery.deliver(company, &records, &new_fp).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Delivery of {domain} for {company} failed: {e}");
                let mut details = json!({ "error": e.to_string(), "count": records.len() });
                if let SyncError::Delivery {
                    batch,
                    total,
                    delivered,
                    ..
                } = &e
                {
                    details["failedBatch"] = json!(batch);
                    details["batches"] = json!(total);
                    details["deliveredBeforeFailure"] = json!(delivered);
                }
                self.emit(
                    ctx.event(
                        AuditStage::Sync,
                        AuditStatus::Error,
                        format!("Failed to sync {domain} to cloud"),
                    )
                    .with_details(details),
                )
                .await;
                return UnitOutcome::DeliveryFailed {
                    error: e.to_string(),
                };
            }
        };

        // ── Commit ───────────────────────────────────────────────
        if let Err(e) = self.store.set(&key, &new_fp) {
            let e = SyncError::from(e);
            warn!("{domain} for {company} delivered but fingerprint commit failed: {e}");
            self.emit(
                ctx.event(
                    AuditStage::Sync,
                    AuditStatus::Error,
                    format!("{domain} synced but fingerprint could not be recorded"),
                )
                .with_details(json!({ "error": e.to_string(), "count": report.records })),
            )
            .await;
            return UnitOutcome::CommitFailed {
                error: e.to_string(),
            };
        }

        self.emit(
            ctx.event(
                AuditStage::Sync,
                AuditStatus::Success,
                format!("{domain} synced successfully to cloud"),
            )
            .with_details(json!({
                "count": report.records,
                "batches": report.batches,
                "hash": new_fp,
            })),
        )
        .await;

        UnitOutcome::Delivered {
            records: report.records,
            batches: report.batches,
            fingerprint: new_fp,
        }
    }

    async fn emit(&self, event: AuditEvent) {
        self.audit.emit(event).await;
    }
}
