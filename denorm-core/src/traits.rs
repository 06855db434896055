//! Capability seams for the external collaborators.
//!
//! The cache store and the search service are both owned by other systems.
//! These traits describe only what denormalization needs from them, so the
//! production adapters and test doubles are interchangeable.

use crate::{Content, ContentId, DenormResult};

/// A string-keyed store of serialized cache entries.
///
/// The store has no notion of TTL; staleness is judged by the reader from
/// the timestamp inside each entry.
///
/// # Async Design
///
/// Methods are async so a networked store can be used without blocking.
/// LMDB and in-memory implementations complete immediately.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> DenormResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> DenormResult<()>;
}

/// Source of truth for content metadata.
///
/// Implementations own any retry, backoff or timeout policy; callers treat
/// an `Err` as a hard failure.
#[async_trait::async_trait]
pub trait SearchClient: Send + Sync {
    /// Fetch the current metadata for `content_id`.
    ///
    /// # Returns
    /// * `Ok(Some(content))` - Content found
    /// * `Ok(None)` - The service answered but has no such content
    /// * `Err(DenormError::Search)` - Network or service failure
    async fn fetch(&self, content_id: &ContentId) -> DenormResult<Option<Content>>;
}
