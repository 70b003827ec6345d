//! Reconciliation engine.

mod error;
mod orchestrator;

pub use error::SyncError;
pub use orchestrator::SyncOrchestrator;
