//! Periodic run driver.

use crate::error::SyncError;
use crate::orchestrator::SyncOrchestrator;
use ledgerbridge_types::AuditSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Starts a cron-sourced run on every interval tick until shut down.
///
/// The first tick fires immediately. Runs execute inline, so a slow run
/// delays the next tick instead of overlapping it; ticks missed meanwhile
/// are dropped. A tick that finds a manual run in progress is skipped.
pub struct Scheduler {
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Runs until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Shutdown is observed between runs; a run in flight is allowed to
    /// finish. Returns the number of runs that completed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut completed = 0;

        info!("Scheduler started, interval {:?}", self.interval);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.orchestrator.run(AuditSource::Cron).await {
                        Ok(report) => {
                            completed += 1;
                            debug!("Scheduled run {} finished with {} units", completed, report.units.len());
                        }
                        Err(SyncError::RunInProgress) => {
                            info!("Previous run still in progress, skipping tick");
                        }
                        Err(e) => {
                            error!("Scheduled run failed: {e}");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped after {completed} runs");
        completed
    }
}
