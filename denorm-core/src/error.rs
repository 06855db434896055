//! Error types for content denormalization

use thiserror::Error;

/// Cache store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Read failed for key {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Entry for key {key} missing after write")]
    MissingAfterWrite { key: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Search service errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search request for {content_id} failed with status {status}: {message}")]
    RequestFailed {
        content_id: String,
        status: u16,
        message: String,
    },

    #[error("Invalid search response for {content_id}: {reason}")]
    InvalidResponse { content_id: String, reason: String },

    #[error("Search for {content_id} was unsuccessful ({status}): {message}")]
    Unsuccessful {
        content_id: String,
        status: String,
        message: String,
    },
}

/// Cache entry encoding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode cache entry for {key}: {reason}")]
    EncodeFailed { key: String, reason: String },

    #[error("Failed to decode cache entry for {key}: {reason}")]
    DecodeFailed { key: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid event type pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Master error type for denormalization.
#[derive(Debug, Clone, Error)]
pub enum DenormError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl DenormError {
    /// Short, stable code attached to failure routing detail.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(StoreError::MissingAfterWrite { .. }) => "store.missing_after_write",
            Self::Store(_) => "store.unavailable",
            Self::Search(SearchError::RequestFailed { .. }) => "search.request_failed",
            Self::Search(SearchError::InvalidResponse { .. }) => "search.invalid_response",
            Self::Search(SearchError::Unsuccessful { .. }) => "search.unsuccessful",
            Self::Codec(_) => "cache.corrupt_entry",
            Self::Config(_) => "config.invalid",
        }
    }
}

/// Result type alias for denormalization operations.
pub type DenormResult<T> = Result<T, DenormError>;

// =============================================================================
// TESTS
// =============================================================================
