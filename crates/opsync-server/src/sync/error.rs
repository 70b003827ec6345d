//! Reconciliation pass errors.

use thiserror::Error;

/// Why a pass did not produce a [`opsync_core::SyncResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Another pass holds the single-flight guard.
    #[error("Sync already running")]
    AlreadyRunning,

    /// The connectivity check failed.
    #[error("{0}")]
    Connectivity(String),

    /// The candidate fetch failed.
    #[error("{0}")]
    Fetch(String),
}

impl SyncError {
    /// Fatal errors end a started pass and are recorded in the run status.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AlreadyRunning)
    }
}
