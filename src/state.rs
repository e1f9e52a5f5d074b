use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::store::ListingStore;

/// Shared application state: the data-store collaborator behind its trait,
/// plus runtime configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ListingStore>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn ListingStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
