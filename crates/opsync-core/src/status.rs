//! Reconciliation run status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No pass has started since the process came up.
    #[default]
    Never,
    /// A pass is in progress.
    Running,
    /// The last pass completed (possibly with per-record errors).
    Ok,
    /// The last pass aborted on a fatal error.
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Running => "running",
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

/// Observable status of the reconciliation engine.
///
/// Only the orchestrator mutates this; everything else reads snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    /// When the last pass started.
    pub last_run: Option<DateTime<Utc>>,

    pub last_status: SyncState,

    /// Fatal error of the last pass, if it failed.
    pub last_error: Option<String>,

    pub is_running: bool,
}

impl RunStatus {
    /// Mark a pass as started.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.is_running = true;
        self.last_run = Some(now);
        self.last_status = SyncState::Running;
        self.last_error = None;
    }

    /// Mark the current pass as completed.
    pub fn complete(&mut self) {
        self.last_status = SyncState::Ok;
        self.is_running = false;
    }

    /// Mark the current pass as failed with a fatal error.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.last_status = SyncState::Failed;
        self.last_error = Some(error.into());
        self.is_running = false;
    }
}
