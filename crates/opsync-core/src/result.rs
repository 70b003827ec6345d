//! Per-pass reconciliation result.

use serde::{Deserialize, Serialize};

use crate::ExternalId;

/// A failure while reconciling one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub external_id: ExternalId,
    pub error: String,
}

/// Aggregate counts of one reconciliation pass.
///
/// Transient: returned from a single run and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Records that had no local counterpart.
    pub created: u32,

    /// Records that had a local counterpart, whether or not any field changed.
    pub updated: u32,

    /// Notifications that were delivered.
    pub notifications: u32,

    /// Per-record failures, in processing order.
    pub errors: Vec<ItemError>,
}

impl SyncResult {
    /// Record a per-record failure.
    pub fn push_error(&mut self, external_id: ExternalId, error: impl Into<String>) {
        self.errors.push(ItemError {
            external_id,
            error: error.into(),
        });
    }
}
