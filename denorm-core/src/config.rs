//! Configuration types

use crate::error::ConfigError;
use crate::event::FieldPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Topic receiving enriched and passed-through events.
pub const DEFAULT_SUCCESS_TOPIC: &str = "telemetry.content.de_normalized";

/// Topic receiving events whose content lookup failed.
pub const DEFAULT_FAILED_TOPIC: &str = "telemetry.content.de_normalized.fail";

/// Cache entry time-to-live in milliseconds.
pub const DEFAULT_CONTENT_TTL_MS: u64 = 60_000;

// Flat property keys.
const KEY_SUCCESS_TOPIC: &str = "output.success.topic.name";
const KEY_FAILED_TOPIC: &str = "output.failed.topic.name";
const KEY_EVENTS_TO_SKIP: &str = "events.to.skip";
const KEY_EVENTS_TO_ALLOW: &str = "events.to.allow";
const KEY_GID_OVERRIDDEN: &str = "gid.overridden.events";
const KEY_CONTENT_TTL: &str = "content.store.ttl";
const GID_FIELD_SUFFIX: &str = ".gid.field";

/// Denormalization configuration.
///
/// Loaded once and passed by value into the task; nothing reads ambient
/// configuration while events are being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenormConfig {
    pub success_topic: String,
    pub failed_topic: String,
    /// Exact event types that are never enriched.
    #[serde(default)]
    pub events_to_skip: Vec<String>,
    /// Event type patterns (anchored regular expressions) eligible for enrichment.
    #[serde(default)]
    pub events_to_allow: Vec<String>,
    /// Category prefix (`oe`, `ge`, ...) to the field path holding the content id.
    #[serde(default)]
    pub gid_fields: BTreeMap<String, String>,
    pub content_ttl_ms: u64,
}

impl Default for DenormConfig {
    fn default() -> Self {
        Self {
            success_topic: DEFAULT_SUCCESS_TOPIC.to_string(),
            failed_topic: DEFAULT_FAILED_TOPIC.to_string(),
            events_to_skip: Vec::new(),
            events_to_allow: Vec::new(),
            gid_fields: BTreeMap::new(),
            content_ttl_ms: DEFAULT_CONTENT_TTL_MS,
        }
    }
}

impl DenormConfig {
    /// The tuning used by the telemetry pipeline in production.
    ///
    /// Only `GE_LAUNCH_GAME` is allowed from the `GE` family; the other
    /// families are allowed wholesale.
    pub fn telemetry_defaults() -> Self {
        Self::default()
            .with_allow(["GE_LAUNCH_GAME", "OE_.*", "ME_.*", "CE_.*", "CP_.*", "BE_.*"])
            .with_gid_field("oe", "gdata.id")
            .with_gid_field("ge", "edata.eks.gid")
            .with_gid_field("me", "dimensions.content_id")
            .with_gid_field("ce", "context.content_id")
            .with_gid_field("cp", "edata.eks.action")
            .with_gid_field("be", "edata.eks.cid")
    }

    pub fn with_topics(mut self, success: impl Into<String>, failed: impl Into<String>) -> Self {
        self.success_topic = success.into();
        self.failed_topic = failed.into();
        self
    }

    pub fn with_skip<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events_to_skip = events.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allow<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events_to_allow = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gid_field(mut self, category: impl Into<String>, path: impl Into<String>) -> Self {
        self.gid_fields
            .insert(category.into().to_ascii_lowercase(), path.into());
        self
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.content_ttl_ms = ttl_ms;
        self
    }

    /// Build from a flat key/value surface.
    ///
    /// Recognised keys:
    /// - `output.success.topic.name`, `output.failed.topic.name`
    /// - `events.to.skip`, `events.to.allow` (comma-separated, default empty)
    /// - `gid.overridden.events` (comma-separated `<cat>.gid.field` keys)
    /// - `<cat>.gid.field` (field path for that category)
    /// - `content.store.ttl` (milliseconds, default 60000)
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let success_topic = props
            .get(KEY_SUCCESS_TOPIC)
            .cloned()
            .unwrap_or_else(|| DEFAULT_SUCCESS_TOPIC.to_string());
        let failed_topic = props
            .get(KEY_FAILED_TOPIC)
            .cloned()
            .unwrap_or_else(|| DEFAULT_FAILED_TOPIC.to_string());

        let events_to_skip = split_list(props.get(KEY_EVENTS_TO_SKIP));
        let events_to_allow = split_list(props.get(KEY_EVENTS_TO_ALLOW));

        let mut gid_fields = BTreeMap::new();
        for key in split_list(props.get(KEY_GID_OVERRIDDEN)) {
            let category = key.strip_suffix(GID_FIELD_SUFFIX).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: KEY_GID_OVERRIDDEN.to_string(),
                    value: key.clone(),
                    reason: format!("entries must end with '{}'", GID_FIELD_SUFFIX),
                }
            })?;
            // Listed but unset categories are ignored.
            if let Some(path) = props.get(&key) {
                gid_fields.insert(category.to_ascii_lowercase(), path.clone());
            }
        }

        let content_ttl_ms = match props.get(KEY_CONTENT_TTL) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                field: KEY_CONTENT_TTL.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_CONTENT_TTL_MS,
        };

        let config = Self {
            success_topic,
            failed_topic,
            events_to_skip,
            events_to_allow,
            gid_fields,
            content_ttl_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the category table into field paths keyed by lower-case category.
    ///
    /// Keys differing only in case are rejected.
    pub fn field_paths(&self) -> Result<BTreeMap<String, FieldPath>, ConfigError> {
        let mut paths = BTreeMap::new();
        for (category, raw) in &self.gid_fields {
            let path = FieldPath::parse(raw).map_err(|_| ConfigError::InvalidValue {
                field: format!("gid_fields.{}", category),
                value: raw.clone(),
                reason: "must be a dotted path of non-empty segments".to_string(),
            })?;
            let key = category.trim().to_ascii_lowercase();
            if paths.insert(key.clone(), path).is_some() {
                return Err(ConfigError::InvalidValue {
                    field: "gid_fields".to_string(),
                    value: category.clone(),
                    reason: format!("category '{}' is mapped more than once", key),
                });
            }
        }
        Ok(paths)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - topic names are non-empty
    /// - skip/allow entries are non-blank
    /// - category keys are non-blank and unique ignoring case
    /// - every field path parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.success_topic.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "success_topic".to_string(),
            });
        }
        if self.failed_topic.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "failed_topic".to_string(),
            });
        }
        if let Some(blank) = self.events_to_skip.iter().find(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "events_to_skip".to_string(),
                value: blank.clone(),
                reason: "entries must not be blank".to_string(),
            });
        }
        if let Some(blank) = self.events_to_allow.iter().find(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "events_to_allow".to_string(),
                value: blank.clone(),
                reason: "entries must not be blank".to_string(),
            });
        }
        if self.gid_fields.keys().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "gid_fields".to_string(),
                value: String::new(),
                reason: "category keys must not be blank".to_string(),
            });
        }
        self.field_paths()?;
        Ok(())
    }
}

fn split_list(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
