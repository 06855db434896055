//! Line-oriented driver: one JSON event per input line.

use denorm_core::{CacheStore, Event, SearchClient};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::error::PipelineResult;
use crate::outcome::{Destination, FailureDetail, RoutingOutcome};
use crate::sink::{OutgoingEnvelope, RoutingSink};
use crate::task::EnrichmentTask;

/// Field holding the raw text of an input line that was not an event.
pub const RAW_LINE_FIELD: &str = "raw_line";

/// Counts from one [`run_lines`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatched: u64,
    /// Lines that were not a JSON object, routed to the failed topic.
    pub malformed: u64,
}

/// Feed every line of `input` through `task` into `sink`, in order.
///
/// Blank lines are ignored. A line that is not a JSON object is wrapped as
/// `{"raw_line": ...}` and sent to the failed topic. The run ends at end of
/// input or on a sink error.
pub async fn run_lines<R, S, C, K>(
    task: &EnrichmentTask<S, C>,
    input: R,
    sink: &K,
) -> PipelineResult<RunSummary>
where
    R: AsyncBufRead + Unpin,
    S: CacheStore,
    C: SearchClient,
    K: RoutingSink + ?Sized,
{
    let mut summary = RunSummary::default();
    let mut lines = input.lines();
    let mut line_no: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        match parse_event(&line) {
            Ok(event) => {
                task.dispatch(event, sink).await?;
                summary.dispatched += 1;
            }
            Err(reason) => {
                summary.malformed += 1;
                warn!(line = line_no, %reason, "Routing unreadable input line to failure");
                sink.send(malformed_envelope(task, line, reason))?;
            }
        }
    }

    info!(
        dispatched = summary.dispatched,
        malformed = summary.malformed,
        stats = ?task.stats(),
        cache = ?task.cache_stats(),
        "Input exhausted"
    );
    Ok(summary)
}

fn parse_event(line: &str) -> Result<Event, String> {
    let value =
        serde_json::from_str::<Value>(line).map_err(|e| format!("invalid JSON: {}", e))?;
    Event::from_value(value).ok_or_else(|| "input line is not a JSON object".to_string())
}

fn malformed_envelope<S, C>(
    task: &EnrichmentTask<S, C>,
    line: String,
    reason: String,
) -> OutgoingEnvelope
where
    S: CacheStore,
    C: SearchClient,
{
    let mut fields = Map::new();
    fields.insert(RAW_LINE_FIELD.to_string(), Value::String(line));
    let outcome = RoutingOutcome::Failure {
        event: Event::new(fields),
        detail: FailureDetail::malformed_input(reason),
    };
    OutgoingEnvelope::new(task.topic_for(Destination::Failure), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::MALFORMED_INPUT_CODE;
    use crate::sink::{CollectingSink, JsonLinesSink};
    use crate::telemetry::{build_subscriber, LogFormat, LoggingConfig};
    use denorm_core::{Content, ContentId, DenormConfig, DenormResult};
    use denorm_storage::InMemoryCacheStore;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    struct OneContent;

    #[async_trait::async_trait]
    impl SearchClient for OneContent {
        async fn fetch(&self, content_id: &ContentId) -> DenormResult<Option<Content>> {
            Ok(Some(Content::new(content_id.as_str()).with_name("Numbers")))
        }
    }

    fn task() -> EnrichmentTask<InMemoryCacheStore, OneContent> {
        EnrichmentTask::new(
            DenormConfig::telemetry_defaults(),
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(OneContent),
        )
        .unwrap()
    }

    const INPUT: &str = concat!(
        "{\"eid\":\"OE_START\",\"gdata\":{\"id\":\"do_1\"}}\n",
        "\n",
        "not json\n",
        "[1,2]\n",
        "{\"eid\":\"GE_SESSION_START\"}\n",
    );

    /// In-memory log destination.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_run_lines() {
        let task = task();
        let sink = CollectingSink::new();

        let summary = run_lines(&task, INPUT.as_bytes(), &sink).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                dispatched: 2,
                malformed: 2,
            }
        );
        let sent = sink.envelopes();
        assert_eq!(sent.len(), 4, "every non-blank line produces one envelope");
        assert_eq!(sent[0].destination, Destination::Success);
        assert_eq!(sent[0].event.get("contentdata").unwrap()["name"], "Numbers");
        assert_eq!(sent[3].destination, Destination::Success);
        assert!(sent[3].event.get("contentdata").is_none());
    }

    #[tokio::test]
    async fn test_unreadable_lines_go_to_failed_topic() {
        let task = task();
        let sink = CollectingSink::new();

        run_lines(&task, INPUT.as_bytes(), &sink).await.unwrap();

        let failed = sink.on_topic(&task.config().failed_topic);
        assert_eq!(failed.len(), 2);
        let raw: Vec<&str> = failed
            .iter()
            .filter_map(|e| e.event.get(RAW_LINE_FIELD).and_then(Value::as_str))
            .collect();
        assert_eq!(raw, ["not json", "[1,2]"]);
        for envelope in &failed {
            assert_eq!(envelope.destination, Destination::Failure);
            let detail = envelope.error.as_ref().unwrap();
            assert_eq!(detail.code, MALFORMED_INPUT_CODE);
            assert!(detail.content_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_log_records_stay_out_of_routed_output() {
        let logs = LogBuffer::default();
        let logging = LoggingConfig {
            format: LogFormat::Json,
            filter: "info".to_string(),
        };
        let subscriber = build_subscriber(&logging, logs.clone()).unwrap();
        let _guard = tracing::subscriber::set_default(subscriber);

        let task = task();
        let sink = JsonLinesSink::new(Vec::new());
        run_lines(&task, INPUT.as_bytes(), &sink).await.unwrap();

        let routed = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let envelopes: Vec<Value> = routed
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(envelopes.len(), 4);
        for envelope in &envelopes {
            assert!(envelope.get("topic").is_some());
            assert!(envelope.get("event").is_some());
            assert!(envelope.get("level").is_none());
        }
        assert!(logs.contents().contains("Input exhausted"));
    }
}
