//! HTTP request handlers.

mod health;
mod sync;
mod tasks;

pub use health::{health_check, metrics_handler, not_found};
pub use sync::{sync_config, sync_status, trigger_sync};
pub use tasks::{get_task, get_task_by_external_id, list_tasks, task_stats};
