//! LMDB-backed cache store.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a memory-mapped,
//! persistent key-value store for serialized content cache entries.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The store uses:
//! - Read transactions for `get`
//! - Write transactions for `put`
//!
//! Several workers may share one environment; the last committed write for
//! a key wins.

use std::path::{Path, PathBuf};

use denorm_core::{CacheStore, DenormResult, StoreError};
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};

/// Error type for opening an LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// LMDB-backed content cache store.
///
/// # Example
///
/// ```ignore
/// use denorm_storage::LmdbCacheStore;
///
/// let store = LmdbCacheStore::new("/var/lib/denorm/content", 256)?;
/// store.put("do_30076072", &encoded_entry).await?;
/// let raw = store.get("do_30076072").await?;
/// ```
pub struct LmdbCacheStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Str, Str>,
    /// Directory holding the LMDB files.
    path: PathBuf,
}

impl LmdbCacheStore {
    /// Create a new LMDB cache store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self {
            env,
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Number of entries currently stored.
    pub fn entry_count(&self) -> DenormResult<u64> {
        let rtxn = self.env.read_txn().map_err(|e| StoreError::ReadFailed {
            key: String::new(),
            reason: e.to_string(),
        })?;
        let count = self.db.len(&rtxn).map_err(|e| StoreError::ReadFailed {
            key: String::new(),
            reason: e.to_string(),
        })?;
        Ok(count)
    }
}

#[async_trait::async_trait]
impl CacheStore for LmdbCacheStore {
    async fn get(&self, key: &str) -> DenormResult<Option<String>> {
        let read_failed = |reason: String| StoreError::ReadFailed {
            key: key.to_string(),
            reason,
        };

        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| read_failed(e.to_string()))?;

        let value = self
            .db
            .get(&rtxn, key)
            .map_err(|e| read_failed(e.to_string()))?;

        Ok(value.map(str::to_string))
    }

    async fn put(&self, key: &str, value: &str) -> DenormResult<()> {
        let write_failed = |reason: String| StoreError::WriteFailed {
            key: key.to_string(),
            reason,
        };

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| write_failed(e.to_string()))?;

        self.db
            .put(&mut wtxn, key, value)
            .map_err(|e| write_failed(e.to_string()))?;

        wtxn.commit().map_err(|e| write_failed(e.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for LmdbCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbCacheStore")
            .field("path", &self.path)
            .finish()
    }
}
