//! Shared application state.

use std::sync::Arc;

use eventide_core::clock::Clock;
use eventide_core::repository::Repository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock stamped onto new order events.
    pub clock: Arc<dyn Clock>,
    /// Repository the order handlers load from and save to.
    pub repository: Arc<dyn Repository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, repository: Arc<dyn Repository>) -> Self {
        Self { clock, repository }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
