//! Per-event enrichment driver.
//!
//! Each event goes through classify, resolve id, look up, merge and route,
//! in that order, and yields exactly one [`RoutingOutcome`]. Lookup failures
//! never escape: they become a failure outcome carrying the untouched event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use denorm_core::{
    now_millis, CacheStore, ConfigError, DenormConfig, EpochMillis, Event, SearchClient,
};
use denorm_storage::{CacheStats, ContentCacheEngine};
use tracing::{debug, info, warn};

use crate::classifier::{Classification, EventClassifier};
use crate::outcome::{Destination, FailureDetail, RoutingOutcome};
use crate::sink::{OutgoingEnvelope, RoutingSink, SinkError};

/// Routing counters for one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub processed: u64,
    /// Events that gained `contentdata`.
    pub enriched: u64,
    /// Ineligible events and events without a content id.
    pub passed_through: u64,
    /// Eligible events whose content the search service does not know.
    pub not_found: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct TaskCounters {
    processed: AtomicU64,
    enriched: AtomicU64,
    passed_through: AtomicU64,
    not_found: AtomicU64,
    failed: AtomicU64,
}

impl TaskCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TaskStats {
        TaskStats {
            processed: self.processed.load(Ordering::Relaxed),
            enriched: self.enriched.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// The enrichment stage for one worker.
pub struct EnrichmentTask<S, C>
where
    S: CacheStore,
    C: SearchClient,
{
    config: DenormConfig,
    classifier: EventClassifier,
    engine: ContentCacheEngine<S, C>,
    counters: TaskCounters,
}

impl<S, C> EnrichmentTask<S, C>
where
    S: CacheStore,
    C: SearchClient,
{
    /// Build a task from validated configuration.
    pub fn new(config: DenormConfig, store: Arc<S>, search: Arc<C>) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = EventClassifier::new(&config)?;
        let engine = ContentCacheEngine::from_config(store, search, &config);

        info!(
            success_topic = %config.success_topic,
            failed_topic = %config.failed_topic,
            ttl_ms = config.content_ttl_ms,
            allow = config.events_to_allow.len(),
            skip = config.events_to_skip.len(),
            "Enrichment task ready"
        );

        Ok(Self {
            config,
            classifier,
            engine,
            counters: TaskCounters::default(),
        })
    }

    pub fn config(&self) -> &DenormConfig {
        &self.config
    }

    pub fn classifier(&self) -> &EventClassifier {
        &self.classifier
    }

    pub fn engine(&self) -> &ContentCacheEngine<S, C> {
        &self.engine
    }

    pub fn stats(&self) -> TaskStats {
        self.counters.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.stats()
    }

    /// Output topic for a destination.
    pub fn topic_for(&self, destination: Destination) -> &str {
        match destination {
            Destination::Success => &self.config.success_topic,
            Destination::Failure => &self.config.failed_topic,
        }
    }

    /// Process one event against the current wall-clock time.
    pub async fn process(&self, event: Event) -> RoutingOutcome {
        self.process_at(event, now_millis()).await
    }

    /// Process one event, judging cache staleness at `now`.
    pub async fn process_at(&self, event: Event, now: EpochMillis) -> RoutingOutcome {
        TaskCounters::bump(&self.counters.processed);

        let path = match self.classifier.classify_event(&event) {
            Classification::Eligible(path) => path,
            Classification::NotEligible(reason) => {
                debug!(
                    eid = event.event_type().unwrap_or_default(),
                    reason = reason.as_str(),
                    "Passing event through"
                );
                return self.pass_through(event);
            }
        };

        let Some(content_id) = path.content_id(&event) else {
            debug!(
                eid = event.event_type().unwrap_or_default(),
                field = path.as_str(),
                "No content id on event"
            );
            return self.pass_through(event);
        };

        match self.engine.resolve_content_at(&content_id, now).await {
            Ok(Some(read)) => {
                let mut event = event;
                event.insert(Event::CONTENT_DATA_FIELD, read.content().to_value());
                TaskCounters::bump(&self.counters.enriched);
                debug!(
                    content_id = %content_id,
                    origin = read.origin().as_str(),
                    "Event enriched"
                );
                RoutingOutcome::Success(event)
            }
            Ok(None) => {
                TaskCounters::bump(&self.counters.not_found);
                RoutingOutcome::Success(event)
            }
            Err(err) => {
                let detail = FailureDetail::from_error(&err, &content_id, event.event_type());
                TaskCounters::bump(&self.counters.failed);
                warn!(
                    content_id = %content_id,
                    eid = event.event_type().unwrap_or_default(),
                    code = %detail.code,
                    error = %err,
                    "Routing event to failure"
                );
                RoutingOutcome::Failure { event, detail }
            }
        }
    }

    /// Process one event and hand the outcome to `sink` under its topic.
    pub async fn dispatch<K>(&self, event: Event, sink: &K) -> Result<Destination, SinkError>
    where
        K: RoutingSink + ?Sized,
    {
        let outcome = self.process(event).await;
        let destination = outcome.destination();
        let topic = self.topic_for(destination);
        debug!(destination = destination.as_str(), topic, "Dispatching event");
        sink.send(OutgoingEnvelope::new(topic, outcome))?;
        Ok(destination)
    }

    fn pass_through(&self, event: Event) -> RoutingOutcome {
        TaskCounters::bump(&self.counters.passed_through);
        RoutingOutcome::Success(event)
    }
}

impl<S, C> std::fmt::Debug for EnrichmentTask<S, C>
where
    S: CacheStore,
    C: SearchClient,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentTask")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
