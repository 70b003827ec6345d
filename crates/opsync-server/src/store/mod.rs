//! Local task storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database

mod memory;
mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use opsync_core::{CanonicalTask, CoreError, ExternalId, StoredTask};

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] CoreError),

    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task has no external id")]
    MissingExternalId,
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Local row id.
    pub id: i64,
    /// True if an existing row was overwritten.
    pub was_update: bool,
}

/// Listing filter; all set fields must match exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub project_id: Option<String>,
    pub limit: Option<usize>,
}

impl TaskFilter {
    /// Effective row limit.
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }

    /// Returns true if the task passes every set filter field.
    pub fn matches(&self, task: &CanonicalTask) -> bool {
        fn field_matches(filter: &Option<String>, value: Option<&str>) -> bool {
            filter.as_deref().map_or(true, |f| Some(f) == value)
        }

        field_matches(&self.status, Some(&task.status))
            && field_matches(&self.assignee, Some(&task.assignee))
            && field_matches(&self.project_id, task.project_id.as_deref())
    }
}

/// Task store trait - implemented by all storage backends.
///
/// The reconciliation engine only relies on the two `*_by_external_id`
/// operations; the rest back the HTTP surface and metrics.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Look up a task by its upstream key.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<StoredTask>, StoreError>;

    /// Insert the task, or overwrite the row with the same upstream key.
    async fn upsert_by_external_id(&self, task: &CanonicalTask)
        -> Result<UpsertOutcome, StoreError>;

    /// Get a task by local id.
    async fn get(&self, id: i64) -> Result<Option<StoredTask>, StoreError>;

    /// List tasks, most recently updated upstream first.
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<StoredTask>, StoreError>;

    /// Number of tasks per status value.
    async fn count_by_status(&self) -> Result<Vec<(String, u64)>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let task = CanonicalTask::new("1", "t")
            .with_status("open")
            .with_project("Apollo", Some("17".to_string()));

        assert!(TaskFilter::default().matches(&task));

        let by_status = TaskFilter {
            status: Some("open".to_string()),
            ..Default::default()
        };
        assert!(by_status.matches(&task));

        let by_project = TaskFilter {
            project_id: Some("18".to_string()),
            ..Default::default()
        };
        assert!(!by_project.matches(&task));
    }

    #[test]
    fn test_filter_default_limit() {
        assert_eq!(TaskFilter::default().limit(), DEFAULT_LIST_LIMIT);
    }
}
