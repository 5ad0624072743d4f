use std::sync::atomic::{AtomicU64, Ordering};

use control_tree::Registry;
use shared::domain::ClientId;

pub(crate) struct AppState {
    pub(crate) registry: Registry,
    next_client_id: AtomicU64,
}

impl AppState {
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            registry,
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Ids for connections that did not name themselves. `0` stays reserved.
    pub(crate) fn allocate_client_id(&self) -> ClientId {
        ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed))
    }
}
