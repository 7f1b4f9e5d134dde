use std::sync::Arc;

use bookdex_core::{BookLookup, BookStore, Config, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn BookStore>,
    lookup: Arc<BookLookup>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn BookStore>, lookup: Arc<BookLookup>) -> Self {
        Self {
            config,
            store,
            lookup,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn BookStore {
        self.store.as_ref()
    }

    pub fn lookup(&self) -> &BookLookup {
        &self.lookup
    }
}
