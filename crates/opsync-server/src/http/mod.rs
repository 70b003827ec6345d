//! HTTP server.
//!
//! Provides endpoints for:
//! - Sync trigger and status (`/tasks/sync`, `/tasks/sync/status`, `/tasks/sync/config`)
//! - Local task queries (`/tasks`, `/tasks/:id`, `/tasks/external/:external_id`, `/tasks/stats`)
//! - Health check (`/health`)
//! - Prometheus metrics (`/metrics`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod handlers;
pub mod responses;

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Sync routes
        .route("/tasks/sync", post(handlers::trigger_sync))
        .route("/tasks/sync/status", get(handlers::sync_status))
        .route("/tasks/sync/config", get(handlers::sync_config))
        // Task routes
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks/stats", get(handlers::task_stats))
        .route("/tasks/external/:external_id", get(handlers::get_task_by_external_id))
        .route("/tasks/:id", get(handlers::get_task))
        // Observability routes
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
