//! Event classification: which events are enriched, and from which field.

use std::collections::{BTreeMap, HashSet};

use denorm_core::{ConfigError, DenormConfig, Event, FieldPath};
use regex::Regex;

/// Why an event is not eligible for enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The event has no usable `eid`.
    MissingEventType,
    /// The type is on the skip list.
    Skipped,
    /// No allow pattern matches the type.
    NotAllowed,
    /// The type's category has no configured field path.
    NoFieldMapping,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingEventType => "missing_event_type",
            Self::Skipped => "skipped",
            Self::NotAllowed => "not_allowed",
            Self::NoFieldMapping => "no_field_mapping",
        }
    }
}

/// Classification result for one event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Enrich; the content id lives at this path.
    Eligible(&'a FieldPath),
    NotEligible(SkipReason),
}

impl Classification<'_> {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible(_))
    }
}

/// Category of an event type: the text before the first `_`, lower-cased.
///
/// A type without `_` is its own category.
pub fn category_of(event_type: &str) -> String {
    event_type
        .split('_')
        .next()
        .unwrap_or(event_type)
        .to_ascii_lowercase()
}

/// Decides eligibility from the skip list, allow patterns and field table.
///
/// Allow patterns are anchored, so `GE_LAUNCH_GAME` admits exactly that type
/// while `OE_.*` admits the whole family.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    skip: HashSet<String>,
    allow: Vec<Regex>,
    field_paths: BTreeMap<String, FieldPath>,
}

impl EventClassifier {
    /// Compile the classifier from configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPattern`] for an allow entry that is not a valid
    /// regular expression, and any field path error from the config.
    pub fn new(config: &DenormConfig) -> Result<Self, ConfigError> {
        let allow = config
            .events_to_allow
            .iter()
            .map(|pattern| compile_anchored(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip: config.events_to_skip.iter().cloned().collect(),
            allow,
            field_paths: config.field_paths()?,
        })
    }

    /// Classify an event type code.
    pub fn classify(&self, event_type: &str) -> Classification<'_> {
        if self.skip.contains(event_type) {
            return Classification::NotEligible(SkipReason::Skipped);
        }
        if !self.allow.iter().any(|re| re.is_match(event_type)) {
            return Classification::NotEligible(SkipReason::NotAllowed);
        }
        match self.field_paths.get(&category_of(event_type)) {
            Some(path) => Classification::Eligible(path),
            None => Classification::NotEligible(SkipReason::NoFieldMapping),
        }
    }

    /// Classify an event by its `eid`.
    pub fn classify_event(&self, event: &Event) -> Classification<'_> {
        match event.event_type() {
            Some(event_type) => self.classify(event_type),
            None => Classification::NotEligible(SkipReason::MissingEventType),
        }
    }

    /// Field path configured for a category, if any.
    pub fn field_path(&self, category: &str) -> Option<&FieldPath> {
        self.field_paths.get(&category.to_ascii_lowercase())
    }
}

fn compile_anchored(pattern: &str) -> Result<Regex, ConfigError> {
    let trimmed = pattern.trim();
    Regex::new(&format!("^(?:{})$", trimmed)).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
