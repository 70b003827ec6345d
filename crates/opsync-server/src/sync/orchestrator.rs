//! The reconciliation pass.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use opsync_core::{detect_changes, CanonicalTask, RunStatus, SyncResult};

use super::SyncError;
use crate::notify::{Delivery, NotifyError, Notifier};
use crate::store::{StoreError, TaskStore};
use crate::upstream::UpstreamConnector;

/// Drives reconciliation passes and owns the run status.
///
/// At most one pass runs at a time per orchestrator: the running flag is
/// checked and set under one lock acquisition, and a concurrent call is
/// rejected with [`SyncError::AlreadyRunning`] without touching the status.
pub struct SyncOrchestrator {
    upstream: Arc<dyn UpstreamConnector>,
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    status: Mutex<RunStatus>,
}

impl SyncOrchestrator {
    pub fn new(
        upstream: Arc<dyn UpstreamConnector>,
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            upstream,
            store,
            notifier,
            status: Mutex::new(RunStatus::default()),
        }
    }

    /// Snapshot of the current run status.
    pub fn status(&self) -> RunStatus {
        lock(&self.status).clone()
    }

    /// Run one reconciliation pass.
    pub async fn run(&self) -> Result<SyncResult, SyncError> {
        let pass = self.begin()?;
        info!("Starting sync pass");

        if let Err(e) = self.upstream.test_connection().await {
            let err = SyncError::Connectivity(e.to_string());
            error!(error = %err, "Upstream connectivity check failed");
            pass.fail(&err);
            return Err(err);
        }

        let candidates = match self.upstream.get_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                let err = SyncError::Fetch(e.to_string());
                error!(error = %err, "Failed to fetch upstream tasks");
                pass.fail(&err);
                return Err(err);
            }
        };
        debug!(count = candidates.len(), "Fetched upstream tasks");

        let mut result = SyncResult::default();
        for task in &candidates {
            if let Err(e) = self.reconcile(task, &mut result).await {
                warn!(external_id = %task.external_id, error = %e, "Failed to reconcile task");
                result.push_error(task.external_id.clone(), e.to_string());
            }
        }

        pass.complete();
        info!(
            created = result.created,
            updated = result.updated,
            notifications = result.notifications,
            errors = result.errors.len(),
            "Sync pass completed"
        );
        Ok(result)
    }

    fn begin(&self) -> Result<PassGuard<'_>, SyncError> {
        let mut status = lock(&self.status);
        if status.is_running {
            return Err(SyncError::AlreadyRunning);
        }
        status.begin(Utc::now());
        Ok(PassGuard {
            status: &self.status,
            finished: false,
        })
    }

    async fn reconcile(
        &self,
        task: &CanonicalTask,
        result: &mut SyncResult,
    ) -> Result<(), StoreError> {
        let prior = self.store.find_by_external_id(&task.external_id).await?;
        self.store.upsert_by_external_id(task).await?;

        match prior {
            Some(prior) => {
                let changes = detect_changes(&prior.task, task);
                if !changes.is_empty() {
                    let delivery = self.notifier.notify_changed(task, &changes).await;
                    record_delivery(task, "change", delivery, result);
                }
                result.updated += 1;
            }
            None => {
                let delivery = self.notifier.notify_new(task).await;
                record_delivery(task, "new task", delivery, result);
                result.created += 1;
            }
        }
        Ok(())
    }
}

fn record_delivery(
    task: &CanonicalTask,
    kind: &'static str,
    delivery: Result<Delivery, NotifyError>,
    result: &mut SyncResult,
) {
    match delivery {
        Ok(Delivery::Sent) => result.notifications += 1,
        Ok(Delivery::Disabled) => {}
        Err(e) => {
            warn!(external_id = %task.external_id, kind, error = %e, "Failed to send notification");
        }
    }
}

fn lock(status: &Mutex<RunStatus>) -> MutexGuard<'_, RunStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the running flag when a pass ends, including by cancellation.
struct PassGuard<'a> {
    status: &'a Mutex<RunStatus>,
    finished: bool,
}

impl PassGuard<'_> {
    fn complete(mut self) {
        lock(self.status).complete();
        self.finished = true;
    }

    fn fail(mut self, err: &SyncError) {
        lock(self.status).fail(err.to_string());
        self.finished = true;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            lock(self.status).fail("sync pass aborted");
        }
    }
}
