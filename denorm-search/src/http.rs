//! HTTP client for the composite search API

use crate::retry::RetryPolicy;
use crate::types::{SearchRequest, SearchResponse};
use denorm_core::{ConfigError, Content, ContentId, DenormResult, SearchClient, SearchError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

fn default_timeout_ms() -> u64 {
    5_000
}

/// Connection settings for [`HttpSearchClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchClientConfig {
    /// Full URL of the search endpoint, e.g. `http://search:9000/v3/search`.
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl SearchClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: default_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "search.endpoint".to_string(),
            });
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "search.endpoint".to_string(),
                value: self.endpoint.clone(),
                reason: "must be an http or https URL".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.timeout_ms".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of a single HTTP attempt that did not yield a body.
enum AttemptError {
    /// Transport failure, throttling or a 5xx; worth another try.
    Retryable(SearchError),
    Fatal(SearchError),
}

/// Search client that POSTs identifier lookups to the search API.
///
/// Retries transport errors, 429 and 5xx responses according to its
/// [`RetryPolicy`]. Everything else is reported on the first attempt.
pub struct HttpSearchClient {
    client: Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl HttpSearchClient {
    /// Build a client from validated settings.
    pub fn new(config: &SearchClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "search".to_string(),
                value: config.endpoint.clone(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
            retry: config.retry.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn send_once(
        &self,
        content_id: &ContentId,
        request: &SearchRequest,
    ) -> Result<String, AttemptError> {
        let request_failed = |status: u16, message: String| SearchError::RequestFailed {
            content_id: content_id.to_string(),
            status,
            message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AttemptError::Retryable(request_failed(0, format!("HTTP request failed: {}", e)))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let err = request_failed(status.as_u16(), error_text);
            return Err(if is_retryable(status) {
                AttemptError::Retryable(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        response.text().await.map_err(|e| {
            AttemptError::Retryable(request_failed(
                status.as_u16(),
                format!("Failed to read response body: {}", e),
            ))
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Interpret a search API response body for `content_id`.
///
/// A successful response with no records is `Ok(None)`. When several records
/// come back, the one whose identifier matches wins, else the first.
pub fn interpret_response(content_id: &ContentId, body: &str) -> DenormResult<Option<Content>> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::InvalidResponse {
            content_id: content_id.to_string(),
            reason: format!("Failed to parse response: {}", e),
        })?;

    if !response.is_successful() {
        let params = response.params;
        return Err(SearchError::Unsuccessful {
            content_id: content_id.to_string(),
            status: params.status.unwrap_or_else(|| "missing".to_string()),
            message: params
                .errmsg
                .or(params.err)
                .unwrap_or_else(|| "no error message".to_string()),
        }
        .into());
    }

    let mut records = response.result.content;
    let position = records
        .iter()
        .position(|c| c.identifier.as_deref() == Some(content_id.as_str()))
        .unwrap_or(0);

    if records.is_empty() {
        Ok(None)
    } else {
        Ok(Some(records.swap_remove(position)))
    }
}

#[async_trait::async_trait]
impl SearchClient for HttpSearchClient {
    async fn fetch(&self, content_id: &ContentId) -> DenormResult<Option<Content>> {
        let request = SearchRequest::for_identifier(content_id.as_str());
        let mut attempt: u32 = 0;

        loop {
            match self.send_once(content_id, &request).await {
                Ok(body) => {
                    debug!(content_id = %content_id, attempt, "search response received");
                    return interpret_response(content_id, &body);
                }
                Err(AttemptError::Retryable(err)) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        content_id = %content_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "search attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Retryable(err)) | Err(AttemptError::Fatal(err)) => {
                    return Err(err.into());
                }
            }
        }
    }
}

impl std::fmt::Debug for HttpSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchClient")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish()
    }
}
