//! Periodic sync trigger.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::sync::{SyncError, SyncOrchestrator};

/// Runs a pass at startup and then on every interval tick.
pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Tick until `shutdown` is cancelled.
    ///
    /// Each pass runs on its own task so a slow pass never delays the
    /// timer; overlapping ticks are turned away by the orchestrator.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Periodic sync scheduled"
        );

        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Periodic sync stopped");
                    break;
                }
                _ = timer.tick() => {
                    let orchestrator = self.orchestrator.clone();
                    tokio::spawn(async move {
                        run_scheduled_pass(&orchestrator).await;
                    });
                }
            }
        }
    }
}

async fn run_scheduled_pass(orchestrator: &SyncOrchestrator) {
    match orchestrator.run().await {
        Ok(result) => {
            if !result.errors.is_empty() {
                warn!(
                    errors = result.errors.len(),
                    "Scheduled sync finished with task errors"
                );
            }
            debug!(
                created = result.created,
                updated = result.updated,
                "Scheduled sync finished"
            );
        }
        Err(SyncError::AlreadyRunning) => {
            debug!("Skipping scheduled sync, previous pass still running");
        }
        Err(e) => {
            error!(error = %e, "Scheduled sync failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::store::InMemoryTaskStore;
    use crate::testing::{FakeUpstream, RecordingNotifier};

    #[tokio::test]
    async fn test_runs_immediately_and_repeats_until_shutdown() {
        let upstream = Arc::new(FakeUpstream::with_tasks(Vec::new()));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            upstream.clone(),
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(RecordingNotifier::default()),
        ));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            SyncScheduler::new(orchestrator.clone(), Duration::from_millis(20))
                .run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let passes = upstream.check_calls.load(Ordering::SeqCst);
        assert!(passes >= 2, "expected repeated passes, got {passes}");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(upstream.check_calls.load(Ordering::SeqCst), passes);
    }
}
