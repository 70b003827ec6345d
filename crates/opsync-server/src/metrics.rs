//! Prometheus metrics collection and formatting.
//!
//! This module provides metrics in Prometheus text exposition format.

use std::fmt::Write;

use tracing::warn;

use opsync_core::SyncState;

use crate::state::AppState;

const SYNC_STATES: [SyncState; 4] = [
    SyncState::Never,
    SyncState::Running,
    SyncState::Ok,
    SyncState::Failed,
];

/// Collect all metrics from AppState and format as Prometheus text.
pub async fn collect_metrics(state: &AppState) -> String {
    let mut output = String::new();

    collect_sync_metrics(state, &mut output);
    collect_task_metrics(state, &mut output).await;

    output
}

/// Collect run status metrics.
fn collect_sync_metrics(state: &AppState, output: &mut String) {
    let status = state.orchestrator.status();

    writeln!(output, "# HELP opsync_sync_running Whether a sync pass is in progress").ok();
    writeln!(output, "# TYPE opsync_sync_running gauge").ok();
    writeln!(output, "opsync_sync_running {}", u8::from(status.is_running)).ok();

    writeln!(output).ok();
    writeln!(
        output,
        "# HELP opsync_sync_last_status Outcome of the last sync pass"
    )
    .ok();
    writeln!(output, "# TYPE opsync_sync_last_status gauge").ok();
    for sync_state in SYNC_STATES {
        writeln!(
            output,
            "opsync_sync_last_status{{status=\"{}\"}} {}",
            sync_state.as_str(),
            u8::from(status.last_status == sync_state)
        )
        .ok();
    }

    if let Some(last_run) = status.last_run {
        writeln!(output).ok();
        writeln!(
            output,
            "# HELP opsync_sync_last_run_timestamp_seconds Start time of the last sync pass"
        )
        .ok();
        writeln!(output, "# TYPE opsync_sync_last_run_timestamp_seconds gauge").ok();
        writeln!(
            output,
            "opsync_sync_last_run_timestamp_seconds {}",
            last_run.timestamp()
        )
        .ok();
    }
}

/// Collect stored task counts by status.
async fn collect_task_metrics(state: &AppState, output: &mut String) {
    let counts = match state.store.count_by_status().await {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "Failed to count tasks for metrics");
            return;
        }
    };

    writeln!(output).ok();
    writeln!(output, "# HELP opsync_tasks_total Number of stored tasks by status").ok();
    writeln!(output, "# TYPE opsync_tasks_total gauge").ok();
    for (status, count) in counts {
        writeln!(
            output,
            "opsync_tasks_total{{status=\"{}\"}} {count}",
            escape_label(&status)
        )
        .ok();
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
