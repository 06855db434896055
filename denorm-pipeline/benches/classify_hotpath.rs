use criterion::{criterion_group, criterion_main, Criterion};
use denorm_core::{CacheEntry, Content, DenormConfig, Event};
use denorm_pipeline::{Classification, EventClassifier};
use serde_json::json;
use std::hint::black_box;

fn bench_events() -> Vec<Event> {
    [
        json!({"eid": "OE_START", "gdata": {"id": "do_30076072"}}),
        json!({"eid": "GE_LAUNCH_GAME", "edata": {"eks": {"gid": "do_30076072"}}}),
        json!({"eid": "GE_SESSION_START", "edata": {"eks": {"gid": "do_30076072"}}}),
        json!({"eid": "ME_SESSION_SUMMARY", "dimensions": {"content_id": "do_30076072"}}),
        json!({"eid": "CP_INTERACT", "edata": {"eks": {"action": "do_30076072"}}}),
        json!({"ver": "2.0"}),
    ]
    .into_iter()
    .filter_map(Event::from_value)
    .collect()
}

fn bench_classify_and_resolve(c: &mut Criterion) {
    let classifier =
        EventClassifier::new(&DenormConfig::telemetry_defaults()).expect("build classifier");
    let events = bench_events();

    c.bench_function("pipeline/classify_and_resolve", |b| {
        b.iter(|| {
            for event in &events {
                if let Classification::Eligible(path) =
                    classifier.classify_event(black_box(event))
                {
                    black_box(path.content_id(event));
                }
            }
        });
    });
}

fn bench_entry_decode(c: &mut Criterion) {
    let content = Content::new("do_30076072")
        .with_name("Test Content")
        .with_description("Counting with animals")
        .with_attribute("language", json!(["English", "Hindi"]))
        .with_attribute("gradeLevel", json!(["Grade 1"]));
    let raw = CacheEntry::new(content, 1_700_000_000_000)
        .encode("do_30076072")
        .expect("encode entry");

    c.bench_function("pipeline/cache_entry_decode", |b| {
        b.iter(|| {
            let entry = CacheEntry::decode("do_30076072", black_box(&raw)).expect("decode entry");
            black_box(entry.is_expired(1_700_000_030_000, 60_000));
        });
    });
}

criterion_group!(benches, bench_classify_and_resolve, bench_entry_decode);
criterion_main!(benches);
