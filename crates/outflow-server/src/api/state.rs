use crate::backend::SessionBackend;
use outflow_storage::{CredentialCipher, Storage};
use std::sync::Arc;

/// Application state shared across all API handlers. Built once at
/// startup; everything in it is dependency-injected, nothing global.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub cipher: Arc<CredentialCipher>,
    pub backend: Arc<dyn SessionBackend>,
}

impl AppState {
    pub fn new(
        storage: Arc<Storage>,
        cipher: Arc<CredentialCipher>,
        backend: Arc<dyn SessionBackend>,
    ) -> Self {
        Self {
            storage,
            cipher,
            backend,
        }
    }
}
