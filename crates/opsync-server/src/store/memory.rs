//! In-memory task store (non-persistent).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use opsync_core::{CanonicalTask, ExternalId, StoredTask};

use super::{StoreError, TaskFilter, TaskStore, UpsertOutcome};

#[derive(Default)]
struct Inner {
    tasks: HashMap<i64, StoredTask>,
    by_external_id: HashMap<ExternalId, i64>,
    next_id: i64,
}

/// Task store backed by a map; used for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryTaskStore {
    inner: RwLock<Inner>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Most recent upstream update first, tasks without one last.
fn by_recency(a: &StoredTask, b: &StoredTask) -> Ordering {
    match (&a.task.op_updated_at, &b.task.op_updated_at) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.updated_at.cmp(&a.updated_at))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<StoredTask>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external_id
            .get(external_id)
            .and_then(|id| inner.tasks.get(id))
            .cloned())
    }

    async fn upsert_by_external_id(
        &self,
        task: &CanonicalTask,
    ) -> Result<UpsertOutcome, StoreError> {
        if task.external_id.is_empty() {
            return Err(StoreError::MissingExternalId);
        }

        let now = Utc::now();
        let mut inner = self.inner.write().await;

        let existing = inner.by_external_id.get(&task.external_id).copied();
        if let Some(id) = existing {
            if let Some(stored) = inner.tasks.get_mut(&id) {
                stored.task = task.clone();
                stored.updated_at = now;
                return Ok(UpsertOutcome {
                    id,
                    was_update: true,
                });
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.tasks.insert(
            id,
            StoredTask {
                id,
                task: task.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        inner.by_external_id.insert(task.external_id.clone(), id);

        Ok(UpsertOutcome {
            id,
            was_update: false,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<StoredTask>, StoreError> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<StoredTask>, StoreError> {
        let mut tasks: Vec<StoredTask> = self
            .inner
            .read()
            .await
            .tasks
            .values()
            .filter(|t| filter.matches(&t.task))
            .cloned()
            .collect();
        tasks.sort_by(by_recency);
        tasks.truncate(filter.limit());
        Ok(tasks)
    }

    async fn count_by_status(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for stored in self.inner.read().await.tasks.values() {
            *counts.entry(stored.task.status.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str, updated: Option<&str>) -> CanonicalTask {
        let mut task = CanonicalTask::new(id, format!("Task {}", id)).with_status(status);
        task.op_updated_at = updated.map(str::to_string);
        task
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = InMemoryTaskStore::new();

        let first = store.upsert_by_external_id(&task("1", "open", None)).await.unwrap();
        assert!(!first.was_update);

        let second = store
            .upsert_by_external_id(&task("1", "closed", None))
            .await
            .unwrap();
        assert!(second.was_update);
        assert_eq!(first.id, second.id);
        assert_eq!(store.len().await, 1);

        let stored = store
            .find_by_external_id(&ExternalId::new("1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.task.status, "closed");
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_find_unknown_returns_none() {
        let store = InMemoryTaskStore::new();
        assert!(store
            .find_by_external_id(&ExternalId::new("404"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_external_id_rejected() {
        let store = InMemoryTaskStore::new();
        let err = store.upsert_by_external_id(&task("", "open", None)).await;
        assert!(matches!(err, Err(StoreError::MissingExternalId)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_orders_by_upstream_update() {
        let store = InMemoryTaskStore::new();
        store.upsert_by_external_id(&task("a", "open", None)).await.unwrap();
        store
            .upsert_by_external_id(&task("b", "open", Some("2024-01-01 00:00:00")))
            .await
            .unwrap();
        store
            .upsert_by_external_id(&task("c", "closed", Some("2024-02-01 00:00:00")))
            .await
            .unwrap();

        let all = store.list(&TaskFilter::default()).await.unwrap();
        let keys: Vec<&str> = all.iter().map(|t| t.task.external_id.as_str()).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);

        let open = store
            .list(&TaskFilter {
                status: Some("open".to_string()),
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].task.external_id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let store = InMemoryTaskStore::new();
        store.upsert_by_external_id(&task("1", "open", None)).await.unwrap();
        store.upsert_by_external_id(&task("2", "open", None)).await.unwrap();
        store.upsert_by_external_id(&task("3", "closed", None)).await.unwrap();

        assert_eq!(
            store.count_by_status().await.unwrap(),
            vec![("closed".to_string(), 1), ("open".to_string(), 2)]
        );
    }
}
