//! Routing outcomes produced by the enrichment task.

use denorm_core::{ContentId, DenormError, Event};
use serde::{Deserialize, Serialize};

/// Output channel for a processed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Success,
    Failure,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Error code carried by input lines that are not JSON objects.
pub const MALFORMED_INPUT_CODE: &str = "input.malformed";

/// Diagnostic detail attached to a failed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Stable error code, e.g. `search.request_failed`.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl FailureDetail {
    pub fn from_error(
        error: &DenormError,
        content_id: &ContentId,
        event_type: Option<&str>,
    ) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            content_id: Some(content_id.as_str().to_string()),
            event_type: event_type.map(str::to_string),
        }
    }

    /// Detail for an input line that could not be read as an event.
    pub fn malformed_input(reason: impl Into<String>) -> Self {
        Self {
            code: MALFORMED_INPUT_CODE.to_string(),
            message: reason.into(),
            content_id: None,
            event_type: None,
        }
    }
}

/// Exactly one per processed event.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingOutcome {
    /// Enriched or passed through.
    Success(Event),
    /// Content lookup failed; the event is the unmodified input.
    Failure { event: Event, detail: FailureDetail },
}

impl RoutingOutcome {
    pub fn destination(&self) -> Destination {
        match self {
            Self::Success(_) => Destination::Success,
            Self::Failure { .. } => Destination::Failure,
        }
    }

    pub fn event(&self) -> &Event {
        match self {
            Self::Success(event) | Self::Failure { event, .. } => event,
        }
    }

    pub fn into_event(self) -> Event {
        match self {
            Self::Success(event) | Self::Failure { event, .. } => event,
        }
    }

    pub fn detail(&self) -> Option<&FailureDetail> {
        match self {
            Self::Success(_) => None,
            Self::Failure { detail, .. } => Some(detail),
        }
    }

    pub fn is_success(&self) -> bool {
        self.destination() == Destination::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denorm_core::SearchError;
    use serde_json::json;

    #[test]
    fn test_failure_detail_from_error() {
        let err: DenormError = SearchError::RequestFailed {
            content_id: "do_1".into(),
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        let id = ContentId::new("do_1").unwrap();
        let detail = FailureDetail::from_error(&err, &id, Some("OE_START"));

        assert_eq!(detail.code, "search.request_failed");
        assert!(detail.message.contains("bad gateway"));
        assert_eq!(detail.content_id.as_deref(), Some("do_1"));
        assert_eq!(detail.event_type.as_deref(), Some("OE_START"));
    }

    #[test]
    fn test_outcome_accessors() {
        let event = Event::from_value(json!({"eid": "OE_START"})).unwrap();
        let ok = RoutingOutcome::Success(event.clone());
        assert!(ok.is_success());
        assert!(ok.detail().is_none());
        assert_eq!(ok.destination().as_str(), "success");

        let failed = RoutingOutcome::Failure {
            event: event.clone(),
            detail: FailureDetail {
                code: "store.unavailable".into(),
                message: "down".into(),
                content_id: None,
                event_type: None,
            },
        };
        assert_eq!(failed.destination(), Destination::Failure);
        assert_eq!(failed.into_event(), event);
    }

    #[test]
    fn test_detail_serialization_omits_absent_fields() {
        let detail = FailureDetail {
            code: "cache.corrupt_entry".into(),
            message: "bad json".into(),
            content_id: Some("do_1".into()),
            event_type: None,
        };
        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            json!({"code": "cache.corrupt_entry", "message": "bad json", "content_id": "do_1"})
        );
    }
}
