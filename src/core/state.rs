use std::sync::Arc;

use crate::core::config::Settings;
use crate::repositories::Store;
use crate::services::storage::UploadStorage;

/// Shared handles passed to every request. The store is injected so tests
/// can run against the in-memory implementation.
#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn Store>,
    uploads: UploadStorage,
}

impl AppState {
    pub(crate) fn new(settings: Settings, store: Arc<dyn Store>, uploads: UploadStorage) -> Self {
        Self { inner: Arc::new(InnerState { settings, store, uploads }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub(crate) fn uploads(&self) -> &UploadStorage {
        &self.inner.uploads
    }
}
