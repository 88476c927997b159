use std::sync::Arc;

use crate::session::SessionController;
use crate::store::TallyStore;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn TallyStore>,
    pub controller: SessionController,
}

impl AppState {
    pub fn new(store: Arc<dyn TallyStore>) -> Self {
        Self {
            controller: SessionController::new(store.clone()),
            store,
        }
    }
}
