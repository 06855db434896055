//! Denorm Storage - Cache Stores and the Content Cache Engine
//!
//! Implements the [`CacheStore`](denorm_core::CacheStore) capability for LMDB
//! and for process memory, and the cache-aside [`ContentCacheEngine`] that
//! sits between events and the search service.

pub mod cache;
pub mod memory;

pub use cache::{
    CacheStats, ContentCacheEngine, ContentRead, LmdbCacheStore, LmdbStoreError, ReadOrigin,
};
pub use memory::InMemoryCacheStore;
