//! Output sinks for routed events.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use denorm_core::Event;
use serde::Serialize;

use crate::outcome::{Destination, FailureDetail, RoutingOutcome};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to encode envelope for {topic}: {reason}")]
    Encode { topic: String, reason: String },

    #[error("Failed to write envelope for {topic}: {reason}")]
    Write { topic: String, reason: String },

    #[error("Sink lock poisoned")]
    LockPoisoned,
}

/// A routed event addressed to an output topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEnvelope {
    pub topic: String,
    pub destination: Destination,
    pub event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDetail>,
}

impl OutgoingEnvelope {
    pub fn new(topic: impl Into<String>, outcome: RoutingOutcome) -> Self {
        let destination = outcome.destination();
        let (event, error) = match outcome {
            RoutingOutcome::Success(event) => (event, None),
            RoutingOutcome::Failure { event, detail } => (event, Some(detail)),
        };
        Self {
            topic: topic.into(),
            destination,
            event,
            error,
        }
    }
}

/// Accepts routed events. The transport behind it is not our concern.
pub trait RoutingSink: Send + Sync {
    fn send(&self, envelope: OutgoingEnvelope) -> Result<(), SinkError>;
}

/// Keeps every envelope in memory, in send order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    sent: Mutex<Vec<OutgoingEnvelope>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn sent(&self) -> MutexGuard<'_, Vec<OutgoingEnvelope>> {
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn envelopes(&self) -> Vec<OutgoingEnvelope> {
        self.sent().clone()
    }

    pub fn len(&self) -> usize {
        self.sent().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent().is_empty()
    }

    /// Envelopes sent to `topic`.
    pub fn on_topic(&self, topic: &str) -> Vec<OutgoingEnvelope> {
        self.sent()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }
}

impl RoutingSink for CollectingSink {
    fn send(&self, envelope: OutgoingEnvelope) -> Result<(), SinkError> {
        self.sent().push(envelope);
        Ok(())
    }
}

/// Writes one JSON envelope per line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|_| SinkError::LockPoisoned)
    }
}

impl<W: Write + Send> RoutingSink for JsonLinesSink<W> {
    fn send(&self, envelope: OutgoingEnvelope) -> Result<(), SinkError> {
        let line = serde_json::to_string(&envelope).map_err(|e| SinkError::Encode {
            topic: envelope.topic.clone(),
            reason: e.to_string(),
        })?;

        let mut writer = self.writer.lock().map_err(|_| SinkError::LockPoisoned)?;
        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|e| SinkError::Write {
                topic: envelope.topic.clone(),
                reason: e.to_string(),
            })
    }
}

impl<W: Write + Send> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}
