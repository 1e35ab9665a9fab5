use std::sync::Arc;

use crate::store::JsonStore;

/// Shared application state, injected into every handler and the
/// enrichment middleware through the router.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
}

impl AppState {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
