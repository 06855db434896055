//! Search API request and response types

use denorm_core::Content;
use serde::{Deserialize, Serialize};

/// Status reported by the search API for a successful call.
pub const STATUS_SUCCESSFUL: &str = "successful";

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// `{"request": {"filters": {"identifier": ["do_..."]}}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub request: SearchCriteria,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCriteria {
    pub filters: SearchFilters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchFilters {
    pub identifier: Vec<String>,
}

impl SearchRequest {
    /// Search for a single content identifier.
    pub fn for_identifier(content_id: impl Into<String>) -> Self {
        Self {
            request: SearchCriteria {
                filters: SearchFilters {
                    identifier: vec![content_id.into()],
                },
            },
        }
    }
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ver: Option<String>,
    #[serde(default)]
    pub params: ResponseParams,
    #[serde(default)]
    pub result: SearchResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub errmsg: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub content: Vec<Content>,
}

impl SearchResponse {
    pub fn is_successful(&self) -> bool {
        self.params.status.as_deref() == Some(STATUS_SUCCESSFUL)
    }
}
