//! SearchProvider trait: the abstraction over web search backends.
//!
//! A search backend takes a query string and returns a ranked list of hits.
//! Transport failure is reported as an `Err`, never as an empty result list.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SearchError;

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    pub title: String,

    /// Page URL
    pub url: String,

    /// Text excerpt. SearXNG calls this field `content`.
    #[serde(default, alias = "content")]
    pub snippet: String,

    /// Which upstream engine produced the hit
    #[serde(default)]
    pub engine: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        engine: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            engine: engine.into(),
        }
    }
}

/// The response to one search call, results in rank order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as understood by the backend
    #[serde(default)]
    pub query: String,

    /// Backend's estimate of the total hit count
    #[serde(default, alias = "number_of_results")]
    pub total_results: u64,

    /// Ranked results
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// The core search trait.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// A human-readable name for this backend (e.g., "searxng").
    fn name(&self) -> &str;

    /// Run a single search.
    async fn search(&self, query: &str) -> std::result::Result<SearchResponse, SearchError>;

    /// Health check: is the backend answering queries?
    async fn health_check(&self) -> std::result::Result<bool, SearchError> {
        Ok(true)
    }
}
