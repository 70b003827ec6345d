//! Core domain errors.

use thiserror::Error;

/// Core domain errors for opsync.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown relation link type.
    #[error("Unknown link type: {0}")]
    UnknownLinkType(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
