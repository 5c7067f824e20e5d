//! Application state shared across handlers.

use delivery::DeliveryConfig;
use message_store::Store;

use crate::session::SessionLocks;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Message and presence store.
    pub store: Store,
    /// Transport timing.
    pub delivery: DeliveryConfig,
    /// Per-session request serialization.
    pub sessions: SessionLocks,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, delivery: DeliveryConfig) -> Self {
        Self {
            store,
            delivery,
            sessions: SessionLocks::default(),
        }
    }
}
