//! Shared application state for the Cove server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! axum handlers via `Arc`. Besides the injected engine (which owns the
//! store handle) there is no shared mutable in-process state.

use std::sync::Arc;

use cove_core::engine::VaultEngine;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// The vault engine over the configured store.
    pub engine: Arc<VaultEngine>,
    /// Admin credential gating vault creation. `None` refuses all creates.
    pub admin_api_key: Option<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("admin_api_key", &"[REDACTED]")
            .finish()
    }
}
