//! HTTP status API for the ledgerbridge agent.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use ledgerbridge_sync::{RunReport, SyncError, SyncOrchestrator};
use ledgerbridge_types::AuditSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusResponse {
    pub running: bool,
    /// External names, in run order.
    pub companies: Vec<String>,
    pub last_run: Option<RunReport>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

async fn status_handler(
    State(orchestrator): State<Arc<SyncOrchestrator>>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: orchestrator.is_running(),
        companies: orchestrator
            .companies()
            .iter()
            .map(|c| c.external_name.clone())
            .collect(),
        last_run: orchestrator.last_report().await,
    })
}

async fn run_handler(
    State(orchestrator): State<Arc<SyncOrchestrator>>,
) -> Result<Json<RunReport>, ApiError> {
    info!("Manual run requested over HTTP");
    match orchestrator.run(AuditSource::Manual).await {
        Ok(report) => Ok(Json(report)),
        Err(e @ SyncError::RunInProgress) => Err(error(StatusCode::CONFLICT, &e)),
        Err(e) => {
            warn!("Manual run failed: {e}");
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, &e))
        }
    }
}

fn error(status: StatusCode, e: &SyncError) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Build the HTTP API router around a shared orchestrator.
pub fn build_router(orchestrator: Arc<SyncOrchestrator>) -> Router {
    Router::new()
        .route("/api/v1/status", get(status_handler))
        .route("/api/v1/run", post(run_handler))
        .with_state(orchestrator)
}
