//! Types for the search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query parameters for a web or places search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text search query.
    pub query: String,
    /// Optional location; enables country/language hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Maximum results requested.
    pub num: u32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, num: u32) -> Self {
        Self {
            query: query.into(),
            location: None,
            num,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        if !location.trim().is_empty() {
            self.location = Some(location);
        }
        self
    }
}

/// One organic web result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// One business listing from a places search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search API error: {message}")]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    #[error("Rate limited, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Failed to parse search response: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,
}

impl SearchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::ConnectionFailed(_)
            | SearchError::Timeout
            | SearchError::RateLimited { .. } => true,
            SearchError::ApiError { status, .. } => status.is_some_and(|s| s >= 500),
            SearchError::Parse(_) => false,
        }
    }
}

/// Trait for search backends.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Organic web search.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<OrganicResult>, SearchError>;

    /// Local business search.
    async fn places(&self, request: &SearchRequest) -> Result<Vec<PlaceResult>, SearchError>;
}
