//! [`MemoryProfileStore`]: in-process profile store for tests and local runs.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use common::SensitiveFields;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProfileStore, StoreError, StoredProfile};

/// Profiles held in a `BTreeMap` so that [`ProfileStore::list`] is ordered by id.
#[derive(Clone, Debug, Default)]
pub struct MemoryProfileStore {
    inner: Arc<RwLock<BTreeMap<Uuid, StoredProfile>>>,
}

impl MemoryProfileStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns `true` if no profiles are stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredProfile>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredProfile>, StoreError> {
        Ok(self.inner.read().await.values().cloned().collect())
    }

    async fn save(&self, id: Uuid, fields: &SensitiveFields) -> Result<StoredProfile, StoreError> {
        let mut map = self.inner.write().await;
        let entry = map.entry(id).or_insert_with(|| StoredProfile {
            id,
            fields: SensitiveFields::default(),
            updated_at: Utc::now(),
        });
        entry.fields.apply_update(fields);
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
