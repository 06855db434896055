//! Cache-aside content lookup with read-after-write confirmation.
//!
//! A lookup reads the store once. A fresh entry is returned as-is. A missing
//! or expired entry is refreshed from the search service, written back, and
//! then read again so the content handed to the caller is exactly what the
//! store holds.

use std::sync::Arc;

use denorm_core::{
    now_millis, CacheEntry, CacheStore, ContentId, DenormConfig, DenormResult, EpochMillis,
    SearchClient, StoreError,
};
use tracing::{debug, info, warn};

use super::freshness::{ContentRead, ReadOrigin};
use super::stats::{CacheStats, StatsRecorder};

/// Content cache engine.
///
/// # Type Parameters
///
/// - `S`: The cache store holding serialized entries
/// - `C`: The search client consulted on miss or expiry
///
/// # Store traffic
///
/// | Path            | store reads | store writes | searches |
/// |-----------------|-------------|--------------|----------|
/// | hit             | 1           | 0            | 0        |
/// | miss / expired  | 2           | 1            | 1        |
/// | not found       | 1           | 0            | 1        |
///
/// # Example
///
/// ```ignore
/// let engine = ContentCacheEngine::new(store, search, 60_000);
/// if let Some(read) = engine.resolve_content(&content_id).await? {
///     event.insert("contentdata", read.content().to_value());
/// }
/// ```
pub struct ContentCacheEngine<S, C>
where
    S: CacheStore,
    C: SearchClient,
{
    /// The cache store.
    store: Arc<S>,
    /// The search client.
    search: Arc<C>,
    /// Entry time-to-live in milliseconds.
    ttl_ms: u64,
    stats: StatsRecorder,
}

impl<S, C> ContentCacheEngine<S, C>
where
    S: CacheStore,
    C: SearchClient,
{
    /// Create a new engine.
    pub fn new(store: Arc<S>, search: Arc<C>, ttl_ms: u64) -> Self {
        Self {
            store,
            search,
            ttl_ms,
            stats: StatsRecorder::default(),
        }
    }

    /// Create an engine using the TTL from the configuration.
    pub fn from_config(store: Arc<S>, search: Arc<C>, config: &DenormConfig) -> Self {
        Self::new(store, search, config.content_ttl_ms)
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Get a reference to the cache store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the search client.
    pub fn search(&self) -> &C {
        &self.search
    }

    /// Snapshot of the lookup counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Resolve content for `content_id` as of the current wall-clock time.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(read))` - Content from cache or freshly fetched
    /// * `Ok(None)` - The search service has no such content
    /// * `Err(_)` - Store failure, undecodable entry, or search failure
    pub async fn resolve_content(
        &self,
        content_id: &ContentId,
    ) -> DenormResult<Option<ContentRead>> {
        self.resolve_content_at(content_id, now_millis()).await
    }

    /// Resolve content for `content_id`, judging staleness at `now`.
    pub async fn resolve_content_at(
        &self,
        content_id: &ContentId,
        now: EpochMillis,
    ) -> DenormResult<Option<ContentRead>> {
        let result = self.lookup(content_id, now).await;
        if let Err(e) = &result {
            self.stats.record_failure();
            warn!(content_id = %content_id, error = %e, "Content lookup failed");
        }
        result
    }

    async fn lookup(
        &self,
        content_id: &ContentId,
        now: EpochMillis,
    ) -> DenormResult<Option<ContentRead>> {
        let key = content_id.as_str();

        let origin = match self.store.get(key).await? {
            Some(raw) => {
                let entry = CacheEntry::decode(key, &raw)?;
                let age_ms = entry.age_millis(now);
                if !entry.is_expired(now, self.ttl_ms) {
                    self.stats.record_origin(ReadOrigin::Hit);
                    debug!(content_id = %content_id, age_ms, "Content cache hit");
                    return Ok(Some(ContentRead::from_cache(entry)));
                }
                debug!(
                    content_id = %content_id,
                    age_ms,
                    ttl_ms = self.ttl_ms,
                    superseded = ?entry.content.name,
                    "Content cache entry expired"
                );
                ReadOrigin::Expired
            }
            None => {
                debug!(content_id = %content_id, "Content cache miss");
                ReadOrigin::Miss
            }
        };
        self.stats.record_origin(origin);

        self.refresh(content_id, origin, now).await
    }

    /// Fetch from search, write back, and confirm by reading again.
    async fn refresh(
        &self,
        content_id: &ContentId,
        origin: ReadOrigin,
        now: EpochMillis,
    ) -> DenormResult<Option<ContentRead>> {
        let key = content_id.as_str();

        let Some(content) = self.search.fetch(content_id).await? else {
            self.stats.record_not_found();
            info!(content_id = %content_id, "Content not found by search service");
            return Ok(None);
        };

        let encoded = CacheEntry::new(content, now).encode(key)?;
        self.store.put(key, &encoded).await?;
        self.stats.record_write();

        let raw = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| StoreError::MissingAfterWrite {
                key: key.to_string(),
            })?;
        let confirmed = CacheEntry::decode(key, &raw)?;

        debug!(
            content_id = %content_id,
            origin = origin.as_str(),
            "Content cache refreshed"
        );
        Ok(Some(ContentRead::from_refresh(confirmed, origin)))
    }
}
