//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::OrderStore;
use crate::services::PickingService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// record store, picking sessions, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn OrderStore>,
    picking: PickingService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn OrderStore>) -> Self {
        let picking = PickingService::new(
            Arc::clone(&store),
            config.remove_confirm_window,
            config.session_idle_timeout,
        );
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                picking,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the order record store.
    #[must_use]
    pub fn store(&self) -> &dyn OrderStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the picking session registry.
    #[must_use]
    pub fn picking(&self) -> &PickingService {
        &self.inner.picking
    }
}
