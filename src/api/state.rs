//! API shared state

use std::sync::Arc;

use crate::facade::RecordFacade;
use crate::storage::StorageBackend;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Record-level access to the store
    pub records: RecordFacade,
}

impl ApiState {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self {
            records: RecordFacade::new(store),
        }
    }
}
