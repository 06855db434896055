//! Denorm Core - Event, Content and Configuration Types
//!
//! Data types shared by every other crate in the workspace: the telemetry
//! [`Event`] and its dotted [`FieldPath`] navigation, the [`Content`] record
//! and its timestamped [`CacheEntry`], the error taxonomy, and the immutable
//! [`DenormConfig`]. The [`CacheStore`] and [`SearchClient`] capability
//! traits are the seams to the external collaborators.

pub mod config;
pub mod content;
pub mod error;
pub mod event;
pub mod traits;

pub use config::{
    DenormConfig, DEFAULT_CONTENT_TTL_MS, DEFAULT_FAILED_TOPIC, DEFAULT_SUCCESS_TOPIC,
};
pub use content::{CacheEntry, Content};
pub use error::{CodecError, ConfigError, DenormError, DenormResult, SearchError, StoreError};
pub use event::{ContentId, Event, FieldPath};
pub use traits::{CacheStore, SearchClient};

use chrono::Utc;

// ============================================================================
// TIME
// ============================================================================

/// Wall-clock time in milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}
