//! Profile persistence.
//!
//! The store keeps sensitive columns verbatim: it never encrypts, decrypts,
//! or inspects them. Callers pass values through the cipher first.

pub mod memory;
pub mod postgres;

pub use memory::MemoryProfileStore;
pub use postgres::PgProfileStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::SensitiveFields;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected the query or could not be reached.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One persisted client profile, sensitive columns as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProfile {
    pub id: Uuid,
    pub fields: SensitiveFields,
    pub updated_at: DateTime<Utc>,
}

/// Abstraction over profile storage.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fetch one profile by id. A missing profile is `Ok(None)`, not an error.
    async fn get(&self, id: Uuid) -> Result<Option<StoredProfile>, StoreError>;

    /// Every profile, ordered by id.
    async fn list(&self) -> Result<Vec<StoredProfile>, StoreError>;

    /// Insert the profile or update it in place.
    ///
    /// Present fields replace the stored column wholesale; absent fields leave
    /// it untouched.
    async fn save(&self, id: Uuid, fields: &SensitiveFields) -> Result<StoredProfile, StoreError>;
}
