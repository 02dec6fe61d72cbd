//! ledgerbridge agent
//!
//! Runs next to the ERP and keeps the cloud copy of each configured
//! company's customers and inventory current. Every interval it fetches
//! both domains from the local ERP agent and delivers whatever changed
//! since the last successful delivery.
//!
//! Usage:
//!   ledgerbridge-agent --config ledgerbridge.toml            # scheduled
//!   ledgerbridge-agent --config ledgerbridge.toml once       # one run, JSON report
//!   ledgerbridge-agent --config ledgerbridge.toml fingerprints

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerbridge_agent::build_router;
use ledgerbridge_store::open_store;
use ledgerbridge_sync::{Scheduler, SyncConfig, SyncOrchestrator};
use ledgerbridge_types::AuditSource;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "ledgerbridge-agent")]
#[command(about = "Change-detecting ERP to cloud sync agent")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "ledgerbridge.toml", global = true)]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Sync on the configured schedule until interrupted (default)
    Run,
    /// Perform a single run now and print its report as JSON
    Once,
    /// List stored fingerprints
    Fingerprints,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = SyncConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_scheduled(config).await,
        Command::Once => run_once(config).await,
        Command::Fingerprints => list_fingerprints(&config),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn run_scheduled(config: SyncConfig) -> Result<()> {
    let orchestrator = Arc::new(
        SyncOrchestrator::from_config(&config).context("failed to initialise sync")?,
    );
    info!(
        "ledgerbridge agent starting: {} companies, {} store at {}",
        config.companies.len(),
        orchestrator.store().backend_name(),
        config.store.path.display()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(orchestrator.clone(), config.interval());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let server_task = match &config.status.listen {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind status API on {addr}"))?;
            info!("Status API listening on {}", addr);
            let app = build_router(orchestrator.clone());
            let mut rx = shutdown_rx;
            Some(tokio::spawn(async move {
                let shutdown = async move {
                    let _ = rx.changed().await;
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    warn!("Status API stopped: {e}");
                }
            }))
        }
        None => None,
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested, waiting for the current run to finish");
    let _ = shutdown_tx.send(true);

    let runs = scheduler_task.await.context("scheduler task panicked")?;
    if let Some(task) = server_task {
        task.await.context("status API task panicked")?;
    }
    info!("ledgerbridge agent stopped after {runs} scheduled runs");
    Ok(())
}

async fn run_once(config: SyncConfig) -> Result<()> {
    let orchestrator =
        SyncOrchestrator::from_config(&config).context("failed to initialise sync")?;
    let report = orchestrator.run(AuditSource::Manual).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn list_fingerprints(config: &SyncConfig) -> Result<()> {
    let store = open_store(config.store.kind, &config.store.path).with_context(|| {
        format!(
            "failed to open fingerprint store at {}",
            config.store.path.display()
        )
    })?;
    let entries = store.entries()?;
    if entries.is_empty() {
        println!("No fingerprints recorded in {}", config.store.path.display());
        return Ok(());
    }
    for entry in entries {
        println!("{:<40} {}", entry.key.to_string(), entry.fingerprint);
    }
    Ok(())
}
