//! SearXNG client.
//!
//! Calls `GET {base}/search?q=...&format=json` on a self-hosted SearXNG
//! instance. The JSON format must be enabled in the instance's settings.

use std::time::Duration;

use async_trait::async_trait;
use localchat_config::SearchConfig;
use localchat_core::error::SearchError;
use localchat_core::search::{SearchProvider, SearchResponse, SearchResult};
use serde_json::Value;
use tracing::{debug, warn};

/// A SearXNG metasearch instance.
pub struct SearxngProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SearxngProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build a client from the `[search]` config section.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(&config.base_url).with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Extract hits from a SearXNG JSON body.
    ///
    /// Entries missing a title or URL are dropped; a missing `content`
    /// becomes an empty snippet.
    pub fn parse_response(query: &str, body: &Value) -> Result<SearchResponse, SearchError> {
        let Some(raw) = body.get("results") else {
            return Err(SearchError::InvalidResponse(
                "missing `results` field".into(),
            ));
        };
        let Some(raw) = raw.as_array() else {
            return Err(SearchError::InvalidResponse(
                "`results` is not an array".into(),
            ));
        };

        let results: Vec<SearchResult> = raw
            .iter()
            .filter_map(|r| {
                Some(SearchResult::new(
                    r["title"].as_str()?,
                    r["url"].as_str()?,
                    r["content"].as_str().unwrap_or(""),
                    r["engine"].as_str().unwrap_or(""),
                ))
            })
            .collect();

        let total_results = body["number_of_results"]
            .as_u64()
            .or_else(|| body["number_of_results"].as_f64().map(|n| n as u64))
            .unwrap_or(results.len() as u64);

        Ok(SearchResponse {
            query: body["query"].as_str().unwrap_or(query).to_string(),
            total_results,
            results,
        })
    }
}

#[async_trait]
impl SearchProvider for SearxngProvider {
    fn name(&self) -> &str {
        "searxng"
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        let url = format!("{}/search", self.base_url);
        debug!(query, "Querying SearXNG");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "SearXNG returned an error status");
            return Err(SearchError::Api {
                status_code: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        let parsed = Self::parse_response(query, &body)?;
        debug!(query, hits = parsed.results.len(), "SearXNG search finished");
        Ok(parsed)
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        match self.search("test").await {
            Ok(_) => Ok(true),
            Err(SearchError::Network(e)) => Err(SearchError::Network(e)),
            Err(e) => {
                debug!(error = %e, "SearXNG health check failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailing_slash_trimmed() {
        let provider = SearxngProvider::new("http://localhost:8082/");
        assert_eq!(provider.base_url(), "http://localhost:8082");
    }

    #[test]
    fn from_config_uses_url_and_timeout() {
        let config = SearchConfig {
            enabled: true,
            base_url: "http://search.lan".into(),
            timeout_secs: 7,
        };
        let provider = SearxngProvider::from_config(&config);
        assert_eq!(provider.base_url(), "http://search.lan");
        assert_eq!(provider.timeout, Duration::from_secs(7));
    }

    #[test]
    fn parses_results_in_rank_order() {
        let body = json!({
            "query": "capital of France",
            "number_of_results": 120,
            "results": [
                {"title": "Paris", "url": "https://en.wikipedia.org/wiki/Paris",
                 "content": "Paris is the capital of France.", "engine": "wikipedia"},
                {"title": "France", "url": "https://example.org/france"}
            ]
        });
        let parsed = SearxngProvider::parse_response("capital of France", &body).unwrap();
        assert_eq!(parsed.total_results, 120);
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title, "Paris");
        assert_eq!(parsed.results[0].engine, "wikipedia");
        assert_eq!(parsed.results[1].snippet, "");
    }

    #[test]
    fn entries_without_url_are_dropped() {
        let body = json!({"results": [{"title": "no url"}, {"title": "ok", "url": "u"}]});
        let parsed = SearxngProvider::parse_response("q", &body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.query, "q");
    }

    #[test]
    fn empty_results_are_not_an_error() {
        let body = json!({"query": "zzz", "results": []});
        let parsed = SearxngProvider::parse_response("zzz", &body).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn missing_results_field_is_invalid() {
        let err = SearxngProvider::parse_response("q", &json!({"error": "x"})).unwrap_err();
        assert!(matches!(err, SearchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_instance_is_network_error() {
        let provider = SearxngProvider::new("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let err = provider.search("anything").await.unwrap_err();
        assert!(matches!(err, SearchError::Network(_)));
    }
}
