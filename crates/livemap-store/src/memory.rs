use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use livemap_core::StoreEntry;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{validate_key, IncidentStore};

/// In-process store. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, StoreEntry>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `entries`.
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, StoreEntry)>,
    {
        Self {
            entries: Arc::new(RwLock::new(entries.into_iter().collect())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<StoreEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl IncidentStore for MemoryStore {
    async fn list_keys(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn read_all(&self) -> Result<BTreeMap<String, StoreEntry>, StoreError> {
        Ok(self.entries.read().await.clone())
    }

    async fn set(&self, key: &str, entry: &StoreEntry) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_owned(), entry.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}
