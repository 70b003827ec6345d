//! Shared application state.

use std::sync::Arc;

use opsync_openproject::SyncConfiguration;

use crate::store::TaskStore;
use crate::sync::SyncOrchestrator;

/// Shared application state.
pub struct AppState {
    /// The reconciliation engine.
    pub orchestrator: Arc<SyncOrchestrator>,

    /// Local task store, also used by the engine.
    pub store: Arc<dyn TaskStore>,

    /// Upstream sync scope, for display.
    pub sync_config: SyncConfiguration,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        store: Arc<dyn TaskStore>,
        sync_config: SyncConfiguration,
    ) -> Arc<Self> {
        Arc::new(Self {
            orchestrator,
            store,
            sync_config,
        })
    }
}
