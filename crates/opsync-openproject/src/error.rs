//! Error types for the OpenProject connector.

use thiserror::Error;

/// Errors that can occur when talking to OpenProject.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No API key configured.
    #[error("OpenProject API key not configured")]
    MissingApiKey,

    /// Connectivity check failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    /// The API key's user could not be resolved.
    #[error("Could not get current user ID. Please check API key permissions.")]
    CurrentUser,

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A work package could not be mapped.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
}

/// Errors raised while mapping a raw work package.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    /// A timestamp was present but not parseable.
    #[error("invalid timestamp '{value}' in {field}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// A relation link in a link list had no href.
    #[error("{link_type} link without href on work package {work_package}")]
    MissingHref {
        link_type: &'static str,
        work_package: String,
    },
}
