//! Error types for the LocalChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error type.

use thiserror::Error;

/// Failures talking to a language-model server.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures talking to a search backend.
///
/// A search that succeeds with zero hits is *not* an error; it is an
/// `Ok` response with an empty result list.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search API error: {status_code}")]
    Api { status_code: u16 },

    #[error("Search backend unreachable: {0}")]
    Network(String),

    #[error("Malformed search response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 500,
            message: "model crashed".into(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("model crashed"));
    }

    #[test]
    fn search_error_displays_status() {
        let err = SearchError::Api { status_code: 502 };
        assert_eq!(err.to_string(), "Search API error: 502");
    }

    #[test]
    fn search_network_error_keeps_cause() {
        let err = SearchError::Network("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
