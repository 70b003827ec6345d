//! opsync server library
//!
//! Mirrors upstream work packages into a local task store, one
//! reconciliation pass at a time, and announces new and changed tasks.
//! The binary wires these pieces to an HTTP surface and a periodic trigger.

pub mod config;
pub mod http;
pub mod metrics;
pub mod notify;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod sync;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use notify::{Delivery, MessageNotifier, MessageSink, Notifier, NotifierConfig, NotifyError};
pub use scheduler::SyncScheduler;
pub use state::AppState;
pub use store::{InMemoryTaskStore, SqliteTaskStore, StoreError, TaskFilter, TaskStore};
pub use sync::{SyncError, SyncOrchestrator};
pub use upstream::UpstreamConnector;
