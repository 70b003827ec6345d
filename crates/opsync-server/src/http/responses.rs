//! HTTP response envelopes and API errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use opsync_core::SyncResult;

use crate::store::StoreError;

// ============================================================================
// Success envelopes
// ============================================================================

/// `{success: true, data}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{success: true, data: [...], count}`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub count: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Response body of a completed sync pass.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: &'static str,
    pub results: SyncResult,
}

impl SyncResponse {
    pub fn completed(results: SyncResult) -> Self {
        Self {
            success: true,
            message: "Sync completed",
            results,
        }
    }
}

/// Per-status task count.
#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

// ============================================================================
// Error types
// ============================================================================

/// `{success: false, error}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// `{success: false, message}`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// API errors with their HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    /// Requested task does not exist.
    TaskNotFound,
    /// No route matched.
    RouteNotFound,
    /// A sync pass is already in progress.
    SyncAlreadyRunning,
    /// The sync pass failed fatally.
    SyncFailed(String),
    /// Storage failure.
    Store(StoreError),
    /// Anything else.
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::TaskNotFound => (StatusCode::NOT_FOUND, "Task not found".to_string()),
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, "Route not found".to_string()),
            ApiError::SyncAlreadyRunning => {
                let body = MessageResponse {
                    success: false,
                    message: "Sync already running".to_string(),
                };
                return (StatusCode::CONFLICT, Json(body)).into_response();
            }
            ApiError::SyncFailed(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::Store(e) => {
                error!(error = %e, "Task store request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Internal(message) => {
                error!(error = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}
