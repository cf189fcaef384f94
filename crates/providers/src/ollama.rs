//! Native Ollama provider.
//!
//! Talks to Ollama's own API rather than its OpenAI shim so that the
//! `thinking` channel of reasoning models (qwen3, deepseek-r1, qwq) is
//! delivered separately from the visible answer.
//!
//! Supports:
//! - Chat completions (`/api/chat`, non-streaming and NDJSON streaming)
//! - Model listing and health checks (`/api/tags`)

use async_trait::async_trait;
use futures::StreamExt;
use localchat_core::error::ProviderError;
use localchat_core::message::{Message, Role};
use localchat_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::stream_lines::LineBuffer;

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// A provider backed by a local Ollama server.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl OllamaProvider {
    /// Create a provider for the given base URL (without `/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        // Streaming answers from a slow local model may run for minutes,
        // so only the connect phase is bounded client-wide.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_secs(300),
        }
    }

    /// Create a provider for the default local endpoint.
    pub fn local() -> Self {
        Self::new(DEFAULT_OLLAMA_URL)
    }

    /// Override the timeout applied to non-streaming requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The base URL this provider talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                thinking: None,
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let mut options = serde_json::json!({ "temperature": request.temperature });
        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = serde_json::json!(max_tokens);
        }

        serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": stream,
            "options": options,
        })
    }

    /// Map a non-success status to a provider error.
    async fn status_error(model: &str, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, body = %body, "Ollama returned error");

        if status == 404 {
            return ProviderError::ModelNotFound(model.to_string());
        }
        ProviderError::ApiError {
            status_code: status,
            message: error_message(&body),
        }
    }
}

/// Ollama reports errors as `{"error": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}

/// Why an NDJSON line produced no chunk.
#[derive(Debug)]
enum LineError {
    /// Not JSON we understand; skipped.
    Unparseable(serde_json::Error),
    /// The server reported an error mid-stream; the stream is over.
    Server(String),
}

/// Translate one NDJSON line into a stream chunk.
///
/// Returns `None` for lines that carry nothing to deliver.
fn chunk_from_line(line: &str) -> Option<Result<StreamChunk, LineError>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = match serde_json::from_str::<ApiChatResponse>(trimmed) {
        Ok(parsed) => parsed,
        Err(e) => return Some(Err(LineError::Unparseable(e))),
    };

    if let Some(error) = parsed.error {
        return Some(Err(LineError::Server(error)));
    }

    if parsed.done {
        return Some(Ok(StreamChunk::done(parsed.usage())));
    }

    let message = parsed.message?;
    let reasoning = message.thinking.filter(|t| !t.is_empty());
    let content = Some(message.content).filter(|c| !c.is_empty());
    if reasoning.is_none() && content.is_none() {
        return None;
    }

    Some(Ok(StreamChunk {
        content,
        reasoning,
        done: false,
        usage: None,
    }))
}

#[async_trait]
impl localchat_core::Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = Self::request_body(&request, false);

        debug!(model = %request.model, "Sending Ollama completion request");

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::status_error(&request.model, response).await);
        }

        let api_response: ApiChatResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let usage = api_response.usage();
        let api_message = api_response.message.ok_or_else(|| ProviderError::ApiError {
            status_code: 200,
            message: "No message in response".into(),
        })?;

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: api_message.content,
            timestamp: chrono::Utc::now(),
            metadata: serde_json::Map::new(),
        };

        Ok(ProviderResponse {
            message,
            reasoning: api_message.thinking.filter(|t| !t.is_empty()),
            usage,
            model: api_response.model,
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = Self::request_body(&request, true);

        debug!(model = %request.model, "Sending Ollama streaming request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(&request.model, response).await);
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let model = request.model.clone();

        // Spawn task to read the NDJSON byte stream and forward chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(next) = byte_stream.next().await {
                let bytes = match next {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    match chunk_from_line(&line) {
                        Some(Ok(chunk)) => {
                            let done = chunk.done;
                            if tx.send(Ok(chunk)).await.is_err() {
                                debug!(model = %model, "Stream receiver dropped, stopping");
                                return;
                            }
                            if done {
                                return;
                            }
                        }
                        Some(Err(LineError::Server(message))) => {
                            warn!(model = %model, error = %message, "Ollama failed mid-stream");
                            let _ = tx.send(Err(ProviderError::StreamInterrupted(message))).await;
                            return;
                        }
                        Some(Err(LineError::Unparseable(e))) => {
                            trace!(model = %model, line = %line, error = %e, "Ignoring unparseable NDJSON line");
                        }
                        None => {}
                    }
                }
            }

            // Body ended; flush a trailing line, then make sure a done marker goes out
            match lines.finish().and_then(|rest| chunk_from_line(&rest)) {
                Some(Ok(chunk)) => {
                    let done = chunk.done;
                    if tx.send(Ok(chunk)).await.is_err() || done {
                        return;
                    }
                }
                Some(Err(LineError::Server(message))) => {
                    warn!(model = %model, error = %message, "Ollama failed mid-stream");
                    let _ = tx.send(Err(ProviderError::StreamInterrupted(message))).await;
                    return;
                }
                Some(Err(LineError::Unparseable(_))) | None => {}
            }
            let _ = tx.send(Ok(StreamChunk::done(None))).await;
        });

        Ok(rx)
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError {
                status_code: response.status().as_u16(),
                message: "Failed to fetch models".into(),
            });
        }

        let tags: ApiTags = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thinking: Option<String>,
}

/// One `/api/chat` response object; the whole body when not streaming,
/// one NDJSON line when streaming.
#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    message: Option<ApiMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    /// Set when the server fails partway through a stream.
    #[serde(default)]
    error: Option<String>,
}

impl ApiChatResponse {
    fn usage(&self) -> Option<Usage> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (prompt, completion) => {
                let prompt_tokens = prompt.unwrap_or(0);
                let completion_tokens = completion.unwrap_or(0);
                Some(Usage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens + completion_tokens,
                })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiTags {
    #[serde(default)]
    models: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}
