//! Search service adapter.
//!
//! Implements [`denorm_core::SearchClient`] over the composite search HTTP
//! API. The adapter owns timeouts and retry; the cache engine above it sees
//! one call per lookup.

pub mod http;
pub mod retry;
pub mod types;

pub use http::{interpret_response, HttpSearchClient, SearchClientConfig};
pub use retry::RetryPolicy;
pub use types::{SearchRequest, SearchResponse, STATUS_SUCCESSFUL};
