//! In-memory cache store for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use denorm_core::{CacheStore, DenormResult, StoreError};

/// In-memory cache store.
///
/// Entries live for the lifetime of the process. Clones share the same
/// underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCacheStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stored entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> DenormResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> DenormResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_and_overwrite() {
        let store = InMemoryCacheStore::new();
        assert!(store.is_empty());

        store.put("do_1", "a").await.unwrap();
        store.put("do_1", "b").await.unwrap();

        assert_eq!(store.get("do_1").await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = InMemoryCacheStore::new();
        let other = store.clone();
        store.put("do_1", "a").await.unwrap();
        assert_eq!(other.get("do_1").await.unwrap().as_deref(), Some("a"));

        other.clear();
        assert!(store.get("do_1").await.unwrap().is_none());
    }
}
