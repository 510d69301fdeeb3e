//! Application state for the web layer.

use std::sync::Arc;

use crate::store::CrossingStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Crossing, check and subscription store
    pub store: Arc<dyn CrossingStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CrossingStore>) -> Self {
        Self { store }
    }
}
