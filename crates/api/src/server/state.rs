//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use vault::{FieldCipher, ProfileStore};

/// Application state shared across all request handlers.
///
/// All fields are `Arc`-wrapped so that Axum can clone the state for each
/// request without copying the cipher or the store.
#[derive(Clone)]
pub struct AppState {
    /// Field cipher built once at startup from `ENCRYPTION_KEY`.
    pub cipher: Arc<FieldCipher>,
    /// Profile persistence.
    pub store: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Create a new [`AppState`] from a cipher and a store.
    pub fn new(cipher: Arc<FieldCipher>, store: Arc<dyn ProfileStore>) -> Self {
        Self { cipher, store }
    }

    /// State backed by an empty in-memory store.
    #[cfg(test)]
    pub fn in_memory(cipher: Arc<FieldCipher>) -> Self {
        Self::new(cipher, Arc::new(vault::MemoryProfileStore::new()))
    }
}
