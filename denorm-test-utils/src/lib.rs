//! Denormalization Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Recording cache store and scripted search client
//! - Proptest generators for events and content
//! - Fixtures mirroring real telemetry events
//! - Assertions over `DenormResult` and enriched events

pub use denorm_core::{
    now_millis, CacheEntry, CacheStore, Content, ContentId, DenormConfig, DenormError,
    DenormResult, EpochMillis, Event, FieldPath, SearchClient, SearchError, StoreError,
};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// TEST DOUBLES
// ============================================================================

/// A call observed by [`RecordingCacheStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Put(String, String),
}

#[derive(Debug, Default)]
struct RecordingState {
    entries: HashMap<String, String>,
    scripted: HashMap<String, VecDeque<Option<String>>>,
    calls: Vec<StoreCall>,
    drop_writes: bool,
    fail_reads: bool,
}

/// In-memory cache store that records every call in order.
///
/// Reads for a key with scripted responses pop those first, so a test can
/// say "absent, then this entry" for the lookup and its confirmation read.
/// Once the script is exhausted reads fall back to the stored map.
#[derive(Debug, Clone, Default)]
pub struct RecordingCacheStore {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value without recording a call.
    pub fn seed(&self, key: impl Into<String>, raw: impl Into<String>) {
        lock(&self.state).entries.insert(key.into(), raw.into());
    }

    /// Store an encoded entry without recording a call.
    pub fn seed_entry(&self, key: &str, entry: &CacheEntry) {
        if let Ok(raw) = entry.encode(key) {
            self.seed(key, raw);
        }
    }

    /// Queue responses returned by the next reads of `key`.
    pub fn script_gets<I>(&self, key: impl Into<String>, responses: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        lock(&self.state)
            .scripted
            .entry(key.into())
            .or_default()
            .extend(responses);
    }

    /// Accept writes without keeping them.
    pub fn drop_writes(&self) {
        lock(&self.state).drop_writes = true;
    }

    /// Make every read fail.
    pub fn fail_reads(&self) {
        lock(&self.state).fail_reads = true;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.state).calls.clone()
    }

    pub fn get_count(&self, key: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::Get(k) if k == key))
            .count()
    }

    pub fn put_count(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::Put(..)))
            .count()
    }

    pub fn total_gets(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call, StoreCall::Get(_)))
            .count()
    }

    /// Current stored value for `key`, ignoring scripts.
    pub fn stored(&self, key: &str) -> Option<String> {
        lock(&self.state).entries.get(key).cloned()
    }
}

#[async_trait]
impl CacheStore for RecordingCacheStore {
    async fn get(&self, key: &str) -> DenormResult<Option<String>> {
        let mut state = lock(&self.state);
        state.calls.push(StoreCall::Get(key.to_string()));

        if state.fail_reads {
            return Err(StoreError::ReadFailed {
                key: key.to_string(),
                reason: "scripted read failure".to_string(),
            }
            .into());
        }

        if let Some(next) = state.scripted.get_mut(key).and_then(VecDeque::pop_front) {
            return Ok(next);
        }
        Ok(state.entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> DenormResult<()> {
        let mut state = lock(&self.state);
        state
            .calls
            .push(StoreCall::Put(key.to_string(), value.to_string()));
        if !state.drop_writes {
            state.entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// What [`StubSearchClient`] answers.
#[derive(Debug, Clone)]
pub enum SearchBehavior {
    /// Return content from the catalogue, or `None` for unknown ids.
    Catalogue(HashMap<String, Content>),
    /// Fail every call with this error.
    Fail(SearchError),
}

/// Search client answering from a fixed catalogue and counting calls.
#[derive(Debug, Clone)]
pub struct StubSearchClient {
    behavior: SearchBehavior,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubSearchClient {
    /// A client that knows nothing; every lookup is not-found.
    pub fn empty() -> Self {
        Self::with_behavior(SearchBehavior::Catalogue(HashMap::new()))
    }

    /// A client that knows exactly these records.
    pub fn with_content<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Content>,
    {
        let catalogue = records
            .into_iter()
            .filter_map(|c| c.identifier.clone().map(|id| (id, c)))
            .collect();
        Self::with_behavior(SearchBehavior::Catalogue(catalogue))
    }

    /// A client whose every call fails.
    pub fn failing(error: SearchError) -> Self {
        Self::with_behavior(SearchBehavior::Fail(error))
    }

    pub fn with_behavior(behavior: SearchBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Ids searched for, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_for(&self, content_id: &str) -> usize {
        lock(&self.calls).iter().filter(|id| *id == content_id).count()
    }
}

#[async_trait]
impl SearchClient for StubSearchClient {
    async fn fetch(&self, content_id: &ContentId) -> DenormResult<Option<Content>> {
        lock(&self.calls).push(content_id.as_str().to_string());
        match &self.behavior {
            SearchBehavior::Catalogue(records) => Ok(records.get(content_id.as_str()).cloned()),
            SearchBehavior::Fail(err) => Err(err.clone().into()),
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating test data.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// Content ids in the `do_<digits>` shape used by the content platform.
    pub fn arb_content_id() -> impl Strategy<Value = String> {
        "do_[0-9]{6,12}"
    }

    /// Event types from the configured families plus unknown ones.
    pub fn arb_event_type() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("GE_LAUNCH_GAME".to_string()),
            "GE_[A-Z]{3,12}",
            "(OE|ME|CE|CP|BE)_[A-Z]{3,12}",
            "[A-Z]{2}_[A-Z]{3,12}",
            "[A-Z]{3,10}",
        ]
    }

    /// Arbitrary scalar JSON leaf.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 _]{0,16}".prop_map(Value::String),
        ]
    }

    /// A field path of one to four short segments.
    pub fn arb_field_path() -> impl Strategy<Value = FieldPath> {
        prop::collection::vec("[a-z_]{1,8}", 1..=4).prop_filter_map(
            "segments must be non-blank",
            |segments| FieldPath::parse(&segments.join(".")).ok(),
        )
    }

    /// Content with a name and a handful of extra attributes.
    ///
    /// Attribute keys never shadow the named fields.
    pub fn arb_content() -> impl Strategy<Value = Content> {
        let attribute_key = "[a-z]{3,10}".prop_filter("must not shadow a named field", |k| {
            !matches!(k.as_str(), "identifier" | "name" | "description")
        });
        (
            arb_content_id(),
            "[A-Za-z ]{1,24}",
            prop::option::of("[A-Za-z ]{0,48}"),
            prop::collection::btree_map(attribute_key, arb_scalar(), 0..4),
        )
            .prop_map(|(id, name, description, attributes)| {
                let mut content = Content::new(id).with_name(name);
                if let Some(description) = description {
                    content = content.with_description(description);
                }
                for (key, value) in attributes {
                    content = content.with_attribute(key, value);
                }
                content
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Telemetry events and content records used across the workspace tests.

    use super::*;
    use serde_json::{json, Value};

    pub const CONTENT_ID: &str = "do_30076072";

    pub fn content_id() -> ContentId {
        ContentId::new(CONTENT_ID).unwrap_or_else(|| unreachable!("fixture id is not blank"))
    }

    /// The content record the search service holds for [`CONTENT_ID`].
    pub fn content() -> Content {
        Content::new(CONTENT_ID)
            .with_name("Test Content")
            .with_description("Counting with animals")
            .with_attribute("contentType", json!("Story"))
            .with_attribute("mimeType", json!("application/vnd.ekstep.ecml-archive"))
            .with_attribute("language", json!(["English"]))
    }

    pub fn entry_at(cached_at_millis: EpochMillis) -> CacheEntry {
        CacheEntry::new(content(), cached_at_millis)
    }

    /// An entry written `age_millis` before `now`.
    pub fn aged_entry_json(now: EpochMillis, age_millis: i64) -> String {
        entry_at(now - age_millis)
            .encode(CONTENT_ID)
            .unwrap_or_else(|e| unreachable!("fixture entry encodes: {e}"))
    }

    /// The production configuration with no skipped events.
    pub fn telemetry_config() -> DenormConfig {
        DenormConfig::telemetry_defaults()
    }

    fn event(value: Value) -> Event {
        Event::from_value(value).unwrap_or_else(|| unreachable!("fixture events are objects"))
    }

    pub fn oe_event() -> Event {
        event(json!({
            "eid": "OE_START",
            "ts": "2016-06-23T11:47:51.203+0530",
            "ver": "2.0",
            "uid": "3ee97c77-3587-4394-aecb-f7a1aaee2a8c",
            "gdata": {"id": CONTENT_ID, "ver": "1"},
            "sid": "2f1c1f4f-4a7f-4d1a-bba1-3b6b5d1a6a2e",
            "did": "cbac4c39f0b8a6b2f6d0cfc1a1b4e5e1",
            "edata": {"eks": {"length": 0}}
        }))
    }

    pub fn ge_launch_event() -> Event {
        event(json!({
            "eid": "GE_LAUNCH_GAME",
            "ts": "2016-06-23T11:47:51.203+0530",
            "ver": "2.0",
            "gdata": {"id": "genie.android", "ver": "4.2"},
            "edata": {"eks": {"gid": CONTENT_ID, "err": ""}}
        }))
    }

    /// A `GE_` event that is not a launch, carrying a content id anyway.
    pub fn other_ge_event() -> Event {
        event(json!({
            "eid": "GE_SESSION_START",
            "ts": "2016-06-23T11:47:51.203+0530",
            "ver": "2.0",
            "gdata": {"id": "genie.android", "ver": "4.2"},
            "edata": {"eks": {"gid": CONTENT_ID}}
        }))
    }

    pub fn me_event() -> Event {
        event(json!({
            "eid": "ME_SESSION_SUMMARY",
            "ver": "1.0",
            "dimensions": {"content_id": CONTENT_ID, "did": "cbac4c39f0b8a6b2"},
            "edata": {"eks": {"timeSpent": 12.5}}
        }))
    }

    pub fn ce_event() -> Event {
        event(json!({
            "eid": "CE_START",
            "ver": "2.0",
            "context": {"content_id": CONTENT_ID, "sid": "s-1"},
            "edata": {"eks": {}}
        }))
    }

    pub fn cp_event() -> Event {
        event(json!({
            "eid": "CP_INTERACT",
            "ver": "2.0",
            "edata": {"eks": {"action": CONTENT_ID, "env": "portal"}}
        }))
    }

    pub fn be_event() -> Event {
        event(json!({
            "eid": "BE_CONTENT_LIFECYCLE",
            "ver": "2.0",
            "edata": {"eks": {"cid": CONTENT_ID, "state": "Live"}}
        }))
    }

    /// An allowed `OE_` event whose id field is absent.
    pub fn event_without_content_id() -> Event {
        event(json!({
            "eid": "OE_START",
            "ts": "2016-06-23T11:47:51.203+0530",
            "ver": "2.0",
            "edata": {"eks": {"length": 0}}
        }))
    }

    /// An allowed `OE_` event whose id field is whitespace.
    pub fn event_with_blank_content_id() -> Event {
        event(json!({
            "eid": "OE_START",
            "gdata": {"id": "   ", "ver": "1"}
        }))
    }

    pub fn event_without_eid() -> Event {
        event(json!({
            "ver": "2.0",
            "gdata": {"id": CONTENT_ID}
        }))
    }

    /// One event per enrichable category, paired with its type.
    pub fn enrichable_events() -> Vec<(&'static str, Event)> {
        vec![
            ("OE_START", oe_event()),
            ("GE_LAUNCH_GAME", ge_launch_event()),
            ("ME_SESSION_SUMMARY", me_event()),
            ("CE_START", ce_event()),
            ("CP_INTERACT", cp_event()),
            ("BE_CONTENT_LIFECYCLE", be_event()),
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for results and enriched events.

    use super::*;
    use serde_json::Value;

    /// Assert that a result failed with the given error code.
    #[track_caller]
    pub fn assert_error_code<T: std::fmt::Debug>(result: &DenormResult<T>, code: &str) {
        match result {
            Err(err) => assert_eq!(err.code(), code, "Wrong error code for {:?}", err),
            other => panic!("Expected error {}, got: {:?}", code, other),
        }
    }

    /// Assert that `event` carries `contentdata` with the content's name and description.
    #[track_caller]
    pub fn assert_enriched_with(event: &Event, content: &Content) {
        let data = event
            .get(Event::CONTENT_DATA_FIELD)
            .unwrap_or_else(|| panic!("Expected contentdata on {:?}", event));
        assert_eq!(
            data.get("name").and_then(Value::as_str),
            content.name(),
            "contentdata name"
        );
        assert_eq!(
            data.get("description").and_then(Value::as_str),
            content.description(),
            "contentdata description"
        );
    }

    /// Assert that `event` has no `contentdata` field.
    #[track_caller]
    pub fn assert_not_enriched(event: &Event) {
        assert!(
            !event.contains_key(Event::CONTENT_DATA_FIELD),
            "Expected no contentdata, got {:?}",
            event.get(Event::CONTENT_DATA_FIELD)
        );
    }
}
