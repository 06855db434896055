//! Telemetry event model and dotted field-path resolution.
//!
//! An [`Event`] is an ordered JSON object. Field paths such as
//! `edata.eks.gid` navigate nested objects; a missing segment, or a
//! non-object encountered before the final segment, resolves to nothing
//! rather than failing.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// EVENT
// ============================================================================

/// One telemetry record, as delivered by the inbound source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Top-level field holding the event type code (e.g. `OE_START`).
    pub const EVENT_TYPE_FIELD: &'static str = "eid";

    /// Top-level field that receives the denormalized content record.
    pub const CONTENT_DATA_FIELD: &'static str = "contentdata";

    /// Wrap an existing JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build an event from an arbitrary JSON value.
    ///
    /// Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The event type code, if present as a non-blank string.
    pub fn event_type(&self) -> Option<&str> {
        self.0
            .get(Self::EVENT_TYPE_FIELD)
            .and_then(Value::as_str)
            .filter(|eid| !eid.trim().is_empty())
    }

    /// Get a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether a top-level field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a top-level field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Resolve a dotted path against this event.
    pub fn resolve(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.0)
    }

    /// Assign a value at a dotted path, creating intermediate objects.
    ///
    /// A non-object found at an intermediate segment is replaced by an
    /// empty object so the assignment always lands.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) {
        let Some((last, parents)) = path.segments.split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert(last.clone(), value);
    }

    /// Borrow the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the event and return it as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Event {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

// ============================================================================
// FIELD PATH
// ============================================================================

/// A parsed dot-separated path into a nested event, e.g. `edata.eks.gid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path. Every segment must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "field_path".to_string(),
                value: raw.to_string(),
                reason: "field path must not be empty".to_string(),
            });
        }

        let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "field_path".to_string(),
                value: raw.to_string(),
                reason: "field path segments must not be empty".to_string(),
            });
        }

        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Individual path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Walk the path through nested objects.
    pub fn resolve<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = root;
        for segment in parents {
            current = current.get(segment)?.as_object()?;
        }
        current.get(last)
    }

    /// Extract a content id from the event at this path.
    ///
    /// Blank strings and non-scalar values count as absent.
    pub fn content_id(&self, event: &Event) -> Option<ContentId> {
        event.resolve(self).and_then(ContentId::from_value)
    }
}

impl FromStr for FieldPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ============================================================================
// CONTENT ID
// ============================================================================

/// A non-blank content identifier, e.g. `do_30076072`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Create a content id, rejecting empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Interpret a resolved event value as a content id.
    ///
    /// Strings and numbers are accepted; everything else is absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s.as_str()),
            Value::Number(n) => Self::new(n.to_string()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
