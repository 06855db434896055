//! Content cache with explicit staleness.
//!
//! Entries are stored as serialized [`CacheEntry`](denorm_core::CacheEntry)
//! values keyed by content id. The store never expires anything itself;
//! the engine judges staleness from each entry's timestamp, which makes
//! entries self-describing and safe to overwrite from any worker.
//!
//! # Example
//!
//! ```ignore
//! let engine = ContentCacheEngine::new(store, search, 60_000);
//! match engine.resolve_content(&content_id).await? {
//!     Some(read) if read.was_cache_hit() => { /* served from cache */ }
//!     Some(read) => { /* refreshed from search */ }
//!     None => { /* search has no such content */ }
//! }
//! ```

pub mod freshness;
pub mod lmdb_backend;
pub mod read_through;
pub mod stats;

pub use freshness::{ContentRead, ReadOrigin};
pub use lmdb_backend::{LmdbCacheStore, LmdbStoreError};
pub use read_through::ContentCacheEngine;
pub use stats::CacheStats;
