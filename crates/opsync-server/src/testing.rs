//! Test doubles for the engine seams.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use opsync_core::{CanonicalTask, ExternalId, StoredTask};

use crate::notify::{Delivery, Notifier, NotifyError};
use crate::store::{InMemoryTaskStore, StoreError, TaskFilter, TaskStore, UpsertOutcome};
use crate::upstream::{BoxError, UpstreamConnector};

/// Scripted upstream.
#[derive(Default)]
pub struct FakeUpstream {
    tasks: Mutex<Vec<CanonicalTask>>,
    check_error: Option<String>,
    fetch_error: Option<String>,
    gate: Option<Arc<Notify>>,
    pub check_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn with_tasks(tasks: Vec<CanonicalTask>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Default::default()
        }
    }

    pub fn failing_check(message: &str) -> Self {
        Self {
            check_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_fetch(message: &str) -> Self {
        Self {
            fetch_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Make every fetch wait for a permit on `gate`.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_tasks(&self, tasks: Vec<CanonicalTask>) {
        *self.tasks.lock().unwrap() = tasks;
    }
}

#[async_trait]
impl UpstreamConnector for FakeUpstream {
    async fn test_connection(&self) -> Result<(), BoxError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        match &self.check_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn get_tasks(&self) -> Result<Vec<CanonicalTask>, BoxError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.fetch_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(self.tasks.lock().unwrap().clone()),
        }
    }
}

#[derive(Clone, Copy, Default)]
enum NotifierMode {
    #[default]
    Deliver,
    Disabled,
    Fail,
}

/// Notifier that records every call.
#[derive(Default)]
pub struct RecordingNotifier {
    mode: NotifierMode,
    new_calls: Mutex<Vec<ExternalId>>,
    changed_calls: Mutex<Vec<(ExternalId, Vec<String>)>>,
}

impl RecordingNotifier {
    pub fn disabled() -> Self {
        Self {
            mode: NotifierMode::Disabled,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: NotifierMode::Fail,
            ..Default::default()
        }
    }

    pub fn new_calls(&self) -> Vec<ExternalId> {
        self.new_calls.lock().unwrap().clone()
    }

    pub fn changed_calls(&self) -> Vec<(ExternalId, Vec<String>)> {
        self.changed_calls.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<Delivery, NotifyError> {
        match self.mode {
            NotifierMode::Deliver => Ok(Delivery::Sent),
            NotifierMode::Disabled => Ok(Delivery::Disabled),
            NotifierMode::Fail => Err(NotifyError::NotConfigured),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_new(&self, task: &CanonicalTask) -> Result<Delivery, NotifyError> {
        self.new_calls.lock().unwrap().push(task.external_id.clone());
        self.outcome()
    }

    async fn notify_changed(
        &self,
        task: &CanonicalTask,
        changes: &[String],
    ) -> Result<Delivery, NotifyError> {
        self.changed_calls
            .lock()
            .unwrap()
            .push((task.external_id.clone(), changes.to_vec()));
        self.outcome()
    }
}

/// In-memory store whose upserts fail for selected keys.
///
/// `record_calls` counts lookups and upserts made by a pass.
pub struct FailingStore {
    inner: InMemoryTaskStore,
    failing: HashSet<String>,
    pub record_calls: AtomicUsize,
}

impl FailingStore {
    pub fn failing_upserts<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            inner: InMemoryTaskStore::new(),
            failing: keys.into_iter().map(str::to_string).collect(),
            record_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TaskStore for FailingStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<StoredTask>, StoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_external_id(external_id).await
    }

    async fn upsert_by_external_id(
        &self,
        task: &CanonicalTask,
    ) -> Result<UpsertOutcome, StoreError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(task.external_id.as_str()) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.upsert_by_external_id(task).await
    }

    async fn get(&self, id: i64) -> Result<Option<StoredTask>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<StoredTask>, StoreError> {
        self.inner.list(filter).await
    }

    async fn count_by_status(&self) -> Result<Vec<(String, u64)>, StoreError> {
        self.inner.count_by_status().await
    }
}
