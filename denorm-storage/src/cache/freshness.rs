//! Freshness metadata for content reads.
//!
//! Every successful lookup reports where its content came from, so callers
//! and logs can tell a cache hit from a refresh.

use denorm_core::{CacheEntry, Content, EpochMillis};

/// Where a content read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadOrigin {
    /// Served from a cache entry younger than the TTL.
    Hit,
    /// No entry existed; fetched from search and written back.
    Miss,
    /// An entry existed but had reached the TTL; fetched and overwritten.
    Expired,
}

impl ReadOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Expired => "expired",
        }
    }
}

/// Result of a content lookup, carrying staleness metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRead {
    /// The content record.
    content: Content,
    /// When the entry backing this read was written.
    cached_at_millis: EpochMillis,
    /// How the read was served.
    origin: ReadOrigin,
}

impl ContentRead {
    /// Create a read from a fresh cache entry.
    pub fn from_cache(entry: CacheEntry) -> Self {
        Self {
            content: entry.content,
            cached_at_millis: entry.cached_at_millis,
            origin: ReadOrigin::Hit,
        }
    }

    /// Create a read from the entry confirmed after a refresh.
    pub fn from_refresh(entry: CacheEntry, origin: ReadOrigin) -> Self {
        Self {
            content: entry.content,
            cached_at_millis: entry.cached_at_millis,
            origin,
        }
    }

    /// Get a reference to the content.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Consume the wrapper and return the content.
    pub fn into_content(self) -> Content {
        self.content
    }

    pub fn cached_at_millis(&self) -> EpochMillis {
        self.cached_at_millis
    }

    pub fn origin(&self) -> ReadOrigin {
        self.origin
    }

    /// Check if this was a cache hit.
    pub fn was_cache_hit(&self) -> bool {
        self.origin == ReadOrigin::Hit
    }

    /// Check if the search service was consulted.
    pub fn was_refreshed(&self) -> bool {
        !self.was_cache_hit()
    }

    /// Age of the backing entry at `now_millis`.
    pub fn age_millis(&self, now_millis: EpochMillis) -> i64 {
        now_millis.saturating_sub(self.cached_at_millis)
    }
}

impl AsRef<Content> for ContentRead {
    fn as_ref(&self) -> &Content {
        &self.content
    }
}
