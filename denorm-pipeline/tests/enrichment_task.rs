//! End-to-end behaviour of the enrichment task against recording doubles.

use std::sync::Arc;

use denorm_core::{DenormConfig, Event, SearchError};
use denorm_pipeline::{CollectingSink, Destination, EnrichmentTask, RoutingOutcome};
use denorm_test_utils::assertions::{assert_enriched_with, assert_not_enriched};
use denorm_test_utils::fixtures::{self, CONTENT_ID};
use denorm_test_utils::{RecordingCacheStore, StoreCall, StubSearchClient};

const NOW: i64 = 1_700_000_000_000;
const SUCCESS_TOPIC: &str = "telemetry.content.de_normalized";
const FAILED_TOPIC: &str = "telemetry.content.de_normalized.fail";

struct Harness {
    store: Arc<RecordingCacheStore>,
    search: Arc<StubSearchClient>,
    task: EnrichmentTask<RecordingCacheStore, StubSearchClient>,
}

fn harness_with(config: DenormConfig, search: StubSearchClient) -> Harness {
    let store = Arc::new(RecordingCacheStore::new());
    let search = Arc::new(search);
    let task = EnrichmentTask::new(config, store.clone(), search.clone()).unwrap();
    Harness { store, search, task }
}

fn harness() -> Harness {
    harness_with(
        fixtures::telemetry_config(),
        StubSearchClient::with_content([fixtures::content()]),
    )
}

fn expect_success(outcome: RoutingOutcome) -> Event {
    match outcome {
        RoutingOutcome::Success(event) => event,
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn blank_content_id_passes_through_without_lookups() {
    let h = harness();
    for event in [fixtures::event_without_content_id(), fixtures::event_with_blank_content_id()] {
        let outcome = h.task.process_at(event.clone(), NOW).await;
        assert_eq!(outcome, RoutingOutcome::Success(event));
    }
    assert!(h.store.calls().is_empty());
    assert_eq!(h.search.call_count(), 0);
}

#[tokio::test]
async fn fresh_cache_entry_skips_search() {
    let h = harness();
    h.store.seed(CONTENT_ID, fixtures::aged_entry_json(NOW, 0));

    let event = expect_success(h.task.process_at(fixtures::oe_event(), NOW).await);

    assert_enriched_with(&event, &fixtures::content());
    assert_eq!(h.store.calls(), vec![StoreCall::Get(CONTENT_ID.to_string())]);
    assert_eq!(h.search.call_count(), 0);
}

#[tokio::test]
async fn cache_miss_searches_writes_and_confirms() {
    let h = harness();

    let event = expect_success(h.task.process_at(fixtures::oe_event(), NOW).await);

    assert_enriched_with(&event, &fixtures::content());
    let calls = h.store.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], StoreCall::Get(CONTENT_ID.to_string()));
    assert!(matches!(&calls[1], StoreCall::Put(key, _) if key == CONTENT_ID));
    assert_eq!(calls[2], StoreCall::Get(CONTENT_ID.to_string()));
    assert_eq!(h.search.calls_for(CONTENT_ID), 1);
}

#[tokio::test]
async fn expired_entry_is_refreshed() {
    let h = harness();
    h.store.seed(CONTENT_ID, fixtures::aged_entry_json(NOW, 100_000));

    let event = expect_success(h.task.process_at(fixtures::oe_event(), NOW).await);

    assert_enriched_with(&event, &fixtures::content());
    assert_eq!(h.store.get_count(CONTENT_ID), 2);
    assert_eq!(h.store.put_count(), 1);
    assert_eq!(h.search.calls_for(CONTENT_ID), 1);

    let stored = h.store.stored(CONTENT_ID).unwrap();
    let entry = denorm_core::CacheEntry::decode(CONTENT_ID, &stored).unwrap();
    assert_eq!(entry.cached_at_millis, NOW);
}

#[tokio::test]
async fn entry_exactly_at_ttl_counts_as_expired() {
    let h = harness();
    h.store.seed(CONTENT_ID, fixtures::aged_entry_json(NOW, 60_000));

    h.task.process_at(fixtures::oe_event(), NOW).await;

    assert_eq!(h.search.call_count(), 1);
    assert_eq!(h.store.put_count(), 1);
}

#[tokio::test]
async fn future_stamped_entry_counts_as_fresh() {
    let h = harness();
    h.store.seed_entry(CONTENT_ID, &fixtures::entry_at(NOW + 30_000));

    let event = expect_success(h.task.process_at(fixtures::oe_event(), NOW).await);

    assert_enriched_with(&event, &fixtures::content());
    assert_eq!(h.store.calls(), vec![StoreCall::Get(CONTENT_ID.to_string())]);
    assert_eq!(h.search.call_count(), 0);
}

#[tokio::test]
async fn every_enrichable_category_is_processed() {
    for (eid, event) in fixtures::enrichable_events() {
        let h = harness();
        // Expired first, then the confirmation read sees a valid entry.
        h.store.script_gets(
            CONTENT_ID,
            [
                Some(fixtures::aged_entry_json(NOW, 100_000)),
                Some(fixtures::aged_entry_json(NOW, -100_000)),
            ],
        );

        let event = expect_success(h.task.process_at(event, NOW).await);

        assert_enriched_with(&event, &fixtures::content());
        assert_eq!(h.search.calls_for(CONTENT_ID), 1, "{eid}");
        assert_eq!(h.store.get_count(CONTENT_ID), 2, "{eid}");
        assert_eq!(h.store.put_count(), 1, "{eid}");
    }
}

#[tokio::test]
async fn ge_events_other_than_launch_are_not_enriched() {
    let h = harness();
    let event = fixtures::other_ge_event();

    let outcome = h.task.process_at(event.clone(), NOW).await;

    assert_eq!(outcome, RoutingOutcome::Success(event));
    assert_eq!(h.store.total_gets(), 0);
    assert_eq!(h.search.call_count(), 0);
}

#[tokio::test]
async fn skipped_types_never_touch_store_or_search() {
    let config = fixtures::telemetry_config().with_skip(["OE_START", "GE_LAUNCH_GAME"]);
    let h = harness_with(config, StubSearchClient::failing(SearchError::RequestFailed {
        content_id: CONTENT_ID.into(),
        status: 500,
        message: "should not be called".into(),
    }));

    for event in [fixtures::oe_event(), fixtures::ge_launch_event()] {
        let outcome = h.task.process_at(event.clone(), NOW).await;
        assert_eq!(outcome, RoutingOutcome::Success(event));
    }
    assert!(h.store.calls().is_empty());
    assert_eq!(h.search.call_count(), 0);
    assert_eq!(h.task.stats().passed_through, 2);
}

#[tokio::test]
async fn events_without_eid_pass_through() {
    let h = harness();
    let event = fixtures::event_without_eid();
    let outcome = h.task.process_at(event.clone(), NOW).await;
    assert_eq!(outcome, RoutingOutcome::Success(event));
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn warm_cache_is_idempotent() {
    let h = harness();

    let first = expect_success(h.task.process_at(fixtures::oe_event(), NOW).await);
    let second = expect_success(h.task.process_at(fixtures::oe_event(), NOW + 1_000).await);

    assert_eq!(first.get("contentdata"), second.get("contentdata"));
    assert_eq!(h.search.call_count(), 1);
    assert_eq!(h.task.cache_stats().hits, 1);
}

#[tokio::test]
async fn search_failure_routes_unmodified_event_to_failure() {
    let h = harness_with(
        fixtures::telemetry_config(),
        StubSearchClient::failing(SearchError::RequestFailed {
            content_id: CONTENT_ID.into(),
            status: 503,
            message: "service unavailable".into(),
        }),
    );
    let event = fixtures::cp_event();

    let outcome = h.task.process_at(event.clone(), NOW).await;

    match outcome {
        RoutingOutcome::Failure { event: failed, detail } => {
            assert_eq!(failed, event);
            assert_not_enriched(&failed);
            assert_eq!(detail.code, "search.request_failed");
            assert_eq!(detail.content_id.as_deref(), Some(CONTENT_ID));
            assert_eq!(detail.event_type.as_deref(), Some("CP_INTERACT"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(h.store.put_count(), 0);
    assert_eq!(h.task.stats().failed, 1);
}

#[tokio::test]
async fn corrupt_cache_entry_routes_to_failure() {
    let h = harness();
    h.store.seed(CONTENT_ID, "{not json");

    let outcome = h.task.process_at(fixtures::oe_event(), NOW).await;

    assert_eq!(outcome.destination(), Destination::Failure);
    assert_eq!(outcome.detail().unwrap().code, "cache.corrupt_entry");
    assert_eq!(h.search.call_count(), 0);
}

#[tokio::test]
async fn lost_write_routes_to_failure() {
    let h = harness();
    h.store.drop_writes();

    let outcome = h.task.process_at(fixtures::oe_event(), NOW).await;

    assert_eq!(outcome.detail().unwrap().code, "store.missing_after_write");
    assert_eq!(h.store.get_count(CONTENT_ID), 2);
}

#[tokio::test]
async fn store_read_failure_routes_to_failure() {
    let h = harness();
    h.store.fail_reads();

    let outcome = h.task.process_at(fixtures::be_event(), NOW).await;

    assert_eq!(outcome.detail().unwrap().code, "store.unavailable");
    assert_eq!(h.search.call_count(), 0);
}

#[tokio::test]
async fn unknown_content_passes_through() {
    let h = harness_with(fixtures::telemetry_config(), StubSearchClient::empty());
    let event = fixtures::me_event();

    let outcome = h.task.process_at(event.clone(), NOW).await;

    assert_eq!(outcome, RoutingOutcome::Success(event));
    assert_eq!(h.store.put_count(), 0);
    assert_eq!(h.task.stats().not_found, 1);
}

#[tokio::test]
async fn dispatch_routes_to_configured_topics() {
    let h = harness_with(
        fixtures::telemetry_config(),
        StubSearchClient::failing(SearchError::Unsuccessful {
            content_id: CONTENT_ID.into(),
            status: "failed".into(),
            message: "index offline".into(),
        }),
    );
    let sink = CollectingSink::new();

    let first = h.task.dispatch(fixtures::other_ge_event(), &sink).await.unwrap();
    let second = h.task.dispatch(fixtures::oe_event(), &sink).await.unwrap();

    assert_eq!(first, Destination::Success);
    assert_eq!(second, Destination::Failure);
    assert_eq!(sink.on_topic(SUCCESS_TOPIC).len(), 1);

    let failed = sink.on_topic(FAILED_TOPIC);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].event, fixtures::oe_event());
    assert_eq!(failed[0].error.as_ref().unwrap().code, "search.unsuccessful");
}
