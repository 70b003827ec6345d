//! Local task queries.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use opsync_core::{ExternalId, StoredTask};

use crate::http::responses::{ApiError, DataResponse, ListResponse, StatusCount};
use crate::state::AppState;
use crate::store::TaskFilter;

/// List tasks, optionally filtered by status, assignee or project id.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<ListResponse<StoredTask>>, ApiError> {
    let tasks = state.store.list(&filter).await?;
    Ok(Json(ListResponse::new(tasks)))
}

/// Get a task by local id.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<StoredTask>>, ApiError> {
    let id: i64 = id.parse().map_err(|_| ApiError::TaskNotFound)?;
    let task = state.store.get(id).await?.ok_or(ApiError::TaskNotFound)?;
    Ok(Json(DataResponse::new(task)))
}

/// Get a task by upstream key.
pub async fn get_task_by_external_id(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<Json<DataResponse<StoredTask>>, ApiError> {
    let task = state
        .store
        .find_by_external_id(&ExternalId::new(external_id))
        .await?
        .ok_or(ApiError::TaskNotFound)?;
    Ok(Json(DataResponse::new(task)))
}

/// Task counts per status.
pub async fn task_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<StatusCount>>>, ApiError> {
    let counts = state
        .store
        .count_by_status()
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    Ok(Json(DataResponse::new(counts)))
}
