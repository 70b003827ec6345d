//! Sync trigger and status handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use opsync_core::RunStatus;
use opsync_openproject::SyncConfiguration;

use crate::http::responses::{ApiError, DataResponse, SyncResponse};
use crate::state::AppState;
use crate::sync::SyncError;

/// Run a sync pass and report its result.
///
/// The pass runs on its own task, so a client that disconnects does not
/// cancel it.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncResponse>, ApiError> {
    info!("Manual sync requested");

    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.run().await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match outcome {
        Ok(results) => Ok(Json(SyncResponse::completed(results))),
        Err(SyncError::AlreadyRunning) => Err(ApiError::SyncAlreadyRunning),
        Err(e) => Err(ApiError::SyncFailed(e.to_string())),
    }
}

/// Current run status.
pub async fn sync_status(State(state): State<Arc<AppState>>) -> Json<DataResponse<RunStatus>> {
    Json(DataResponse::new(state.orchestrator.status()))
}

/// Upstream sync scope.
pub async fn sync_config(
    State(state): State<Arc<AppState>>,
) -> Json<DataResponse<SyncConfiguration>> {
    Json(DataResponse::new(state.sync_config.clone()))
}
