//! Content metadata and the cache entry wrapped around it.

use crate::error::CodecError;
use crate::EpochMillis;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content metadata as returned by the search service.
///
/// Only `identifier`, `name` and `description` are named; every other
/// descriptive attribute is kept verbatim in `attributes`. `name` and
/// `description` are kept as whatever JSON the service returned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Content {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Value::String(name.into()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Value::String(description.into()));
        self
    }

    /// The name, when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }

    /// The description, when it is a string.
    pub fn description(&self) -> Option<&str> {
        self.description.as_ref().and_then(Value::as_str)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Render as the JSON object merged under `contentdata`.
    ///
    /// Named fields come first; attributes never override them.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(identifier) = &self.identifier {
            map.insert("identifier".to_string(), Value::String(identifier.clone()));
        }
        if let Some(name) = &self.name {
            map.insert("name".to_string(), name.clone());
        }
        if let Some(description) = &self.description {
            map.insert("description".to_string(), description.clone());
        }
        for (key, value) in &self.attributes {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            }
        }
        Value::Object(map)
    }
}

/// A cached content record stamped with the time it was written.
///
/// Persisted as `{"content": {...}, "timestamp": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: Content,
    #[serde(rename = "timestamp")]
    pub cached_at_millis: EpochMillis,
}

impl CacheEntry {
    pub fn new(content: Content, cached_at_millis: EpochMillis) -> Self {
        Self {
            content,
            cached_at_millis,
        }
    }

    /// Milliseconds elapsed between writing the entry and `now_millis`.
    ///
    /// Negative when the entry is stamped in the future.
    pub fn age_millis(&self, now_millis: EpochMillis) -> i64 {
        now_millis.saturating_sub(self.cached_at_millis)
    }

    /// An entry is expired once its age reaches the TTL.
    pub fn is_expired(&self, now_millis: EpochMillis, ttl_millis: u64) -> bool {
        let ttl = i64::try_from(ttl_millis).unwrap_or(i64::MAX);
        self.age_millis(now_millis) >= ttl
    }

    /// Serialize for the cache store.
    pub fn encode(&self, key: &str) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::EncodeFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Deserialize a raw store value.
    pub fn decode(key: &str, raw: &str) -> Result<Self, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::DecodeFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}
