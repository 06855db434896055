//! Cache store selected by the settings file.

use std::path::PathBuf;

use denorm_core::{CacheStore, DenormResult};
use denorm_storage::{InMemoryCacheStore, LmdbCacheStore, LmdbStoreError};
use serde::{Deserialize, Serialize};

fn default_max_size_mb() -> usize {
    256
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreSettings {
    /// Process-local map; contents are lost on exit.
    #[default]
    Memory,
    /// LMDB environment at `path`.
    Lmdb {
        path: PathBuf,
        #[serde(default = "default_max_size_mb")]
        max_size_mb: usize,
    },
}

/// The store backing a running pipeline.
#[derive(Debug)]
pub enum PipelineStore {
    Memory(InMemoryCacheStore),
    Lmdb(LmdbCacheStore),
}

impl PipelineStore {
    pub fn open(settings: &StoreSettings) -> Result<Self, LmdbStoreError> {
        match settings {
            StoreSettings::Memory => Ok(Self::Memory(InMemoryCacheStore::new())),
            StoreSettings::Lmdb { path, max_size_mb } => {
                Ok(Self::Lmdb(LmdbCacheStore::new(path, *max_size_mb)?))
            }
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for PipelineStore {
    async fn get(&self, key: &str) -> DenormResult<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::Lmdb(store) => store.get(key).await,
        }
    }

    async fn put(&self, key: &str, value: &str) -> DenormResult<()> {
        match self {
            Self::Memory(store) => store.put(key, value).await,
            Self::Lmdb(store) => store.put(key, value).await,
        }
    }
}
