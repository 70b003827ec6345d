//! opsync Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Database
//! - Runtime specifics
//!
//! All types here describe the reconciliation domain: the canonical task
//! shape, per-pass results, run status, and change detection.

pub mod changes;
pub mod error;
pub mod ids;
pub mod result;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use changes::detect_changes;
pub use error::CoreError;
pub use ids::ExternalId;
pub use result::{ItemError, SyncResult};
pub use status::{RunStatus, SyncState};
pub use task::{CanonicalTask, LinkType, RelatedLink, StoredTask};
