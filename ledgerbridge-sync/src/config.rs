//! Agent configuration, loaded from a TOML file.

use crate::error::{SyncError, SyncResult};
use ledgerbridge_store::StoreKind;
use ledgerbridge_types::Company;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Default inventory batch size accepted by the cloud endpoint.
pub const DEFAULT_INVENTORY_BATCH_SIZE: usize = 500;

/// Full configuration for one agent process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub agent: ErpAgentConfig,
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub status: StatusConfig,
    /// Companies to sync, in run order.
    #[serde(default)]
    pub companies: Vec<Company>,
}

/// How often a run is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Where the local ERP agent listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpAgentConfig {
    #[serde(default = "default_agent_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ErpAgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Cloud endpoints, one per domain plus the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub customers: String,
    pub inventory: String,
    /// Event-log endpoint. When absent, audit events are only logged
    /// locally.
    #[serde(default)]
    pub audit: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_batch_size")]
    pub inventory_batch_size: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            inventory_batch_size: DEFAULT_INVENTORY_BATCH_SIZE,
        }
    }
}

/// Fingerprint store backend and location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
        }
    }
}

/// Optional HTTP status API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Socket address to listen on, e.g. `127.0.0.1:4100`.
    #[serde(default)]
    pub listen: Option<String>,
}

fn default_interval_secs() -> u64 {
    120
}

fn default_agent_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    DEFAULT_INVENTORY_BATCH_SIZE
}

fn default_store_path() -> PathBuf {
    PathBuf::from("hashStore.json")
}

impl SyncConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        let config: SyncConfig =
            toml::from_str(contents).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&contents)?;
        info!(
            "Loaded config from {:?}: {} companies, every {}s",
            path,
            config.companies.len(),
            config.schedule.interval_secs
        );
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> SyncResult<()> {
        if self.companies.is_empty() {
            return Err(SyncError::Config("no companies configured".into()));
        }
        let mut seen = HashSet::new();
        for company in &self.companies {
            if company.internal_name.trim().is_empty() || company.external_name.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "company names must not be blank: {company:?}"
                )));
            }
            if !seen.insert(company.external_name.as_str()) {
                return Err(SyncError::Config(format!(
                    "duplicate external company name: {}",
                    company.external_name
                )));
            }
        }
        if self.schedule.interval_secs == 0 {
            return Err(SyncError::Config("schedule.interval_secs must be > 0".into()));
        }
        if self.delivery.inventory_batch_size == 0 {
            return Err(SyncError::Config(
                "delivery.inventory_batch_size must be > 0".into(),
            ));
        }
        if self.agent.timeout_secs == 0 || self.endpoints.timeout_secs == 0 {
            return Err(SyncError::Config("timeouts must be > 0".into()));
        }
        for (name, url) in [
            ("agent.base_url", Some(&self.agent.base_url)),
            ("endpoints.customers", Some(&self.endpoints.customers)),
            ("endpoints.inventory", Some(&self.endpoints.inventory)),
            ("endpoints.audit", self.endpoints.audit.as_ref()),
        ] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(SyncError::Config(format!("{name} is not an HTTP URL: {url}")));
                }
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.timeout_secs)
    }

    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoints.timeout_secs)
    }
}
