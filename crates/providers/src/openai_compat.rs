//! OpenAI-compatible provider implementation.
//!
//! Works with local servers that expose `/v1/chat/completions`: llama.cpp,
//! vLLM, LM Studio, LocalAI, and Ollama's OpenAI shim.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - `reasoning_content` deltas as a separate reasoning channel
//! - Model listing and health checks

use async_trait::async_trait;
use futures::StreamExt;
use localchat_core::error::ProviderError;
use localchat_core::message::{Message, Role};
use localchat_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::stream_lines::LineBuffer;

/// An OpenAI-compatible model server.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a llama.cpp server provider (convenience constructor).
    pub fn llamacpp(base_url: Option<&str>) -> Self {
        Self::new(
            "llamacpp",
            base_url.unwrap_or("http://localhost:8080/v1"),
            "none", // local servers ignore the key
        )
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
                reasoning_content: None,
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": stream,
        });

        if stream {
            body["stream_options"] = serde_json::json!({ "include_usage": true });
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

/// What one SSE line means for the consumer.
#[derive(Debug)]
enum SseEvent {
    Chunk(StreamChunk),
    Done(Option<Usage>),
    Skip,
}

/// Interpret a single SSE line.
fn parse_sse_line(line: &str) -> Result<SseEvent, serde_json::Error> {
    // Skip empty lines, SSE comments and non-data fields
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();

    // "[DONE]" signals end of stream
    if data == "[DONE]" {
        return Ok(SseEvent::Done(None));
    }

    let stream_resp: StreamResponse = serde_json::from_str(data)?;

    // Usage arrives in a trailing chunk when stream_options.include_usage is set
    if let Some(usage) = stream_resp.usage {
        return Ok(SseEvent::Done(Some(Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        })));
    }

    let Some(choice) = stream_resp.choices.into_iter().next() else {
        return Ok(SseEvent::Skip);
    };

    let content = choice.delta.content.filter(|c| !c.is_empty());
    let reasoning = choice.delta.reasoning_content.filter(|r| !r.is_empty());
    if content.is_none() && reasoning.is_none() {
        return Ok(SseEvent::Skip);
    }

    Ok(SseEvent::Chunk(StreamChunk {
        content,
        reasoning,
        done: false,
        usage: None,
    }))
}

#[async_trait]
impl localchat_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request, false);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(std::time::Duration::from_secs(300))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: choice.message.content.unwrap_or_default(),
            timestamp: chrono::Utc::now(),
            metadata: serde_json::Map::new(),
        };

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            reasoning: choice.message.reasoning_content.filter(|r| !r.is_empty()),
            usage,
            model: api_response.model,
        })
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let models = body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ChunkReceiver, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request, true);

        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    match parse_sse_line(&line) {
                        Ok(SseEvent::Chunk(chunk)) => {
                            if tx.send(Ok(chunk)).await.is_err() {
                                return; // receiver dropped
                            }
                        }
                        Ok(SseEvent::Done(usage)) => {
                            let _ = tx.send(Ok(StreamChunk::done(usage))).await;
                            return;
                        }
                        Ok(SseEvent::Skip) => {}
                        Err(e) => {
                            trace!(
                                provider = %provider_name,
                                line = %line,
                                error = %e,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                    }
                }
            }

            // Stream ended without [DONE]; send the final chunk anyway
            let _ = tx.send(Ok(StreamChunk::done(None))).await;
        });

        Ok(rx)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use localchat_core::Provider;

    #[test]
    fn llamacpp_constructor() {
        let provider = OpenAiCompatProvider::llamacpp(None);
        assert_eq!(provider.name(), "llamacpp");
        assert!(provider.base_url.contains("localhost:8080"));
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn streaming_body_requests_usage() {
        let request = ProviderRequest::prompt("local-model", "hi");
        let body = OpenAiCompatProvider::request_body(&request, true);
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);

        let body = OpenAiCompatProvider::request_body(&request, false);
        assert!(body.get("stream_options").is_none());
    }

    // --- SSE parsing tests ---

    #[test]
    fn parse_stream_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        match parse_sse_line(line).unwrap() {
            SseEvent::Chunk(chunk) => {
                assert_eq!(chunk.content.as_deref(), Some("Hello"));
                assert!(chunk.reasoning.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parse_stream_reasoning_delta() {
        let line = r#"data: {"choices":[{"delta":{"reasoning_content":"Think..."}}]}"#;
        match parse_sse_line(line).unwrap() {
            SseEvent::Chunk(chunk) => {
                assert_eq!(chunk.reasoning.as_deref(), Some("Think..."));
                assert!(chunk.content.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parse_stream_finish_chunk_is_skipped() {
        let line = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert!(matches!(parse_sse_line(line).unwrap(), SseEvent::Skip));
    }

    #[test]
    fn parse_stream_usage_ends_stream() {
        let line = r#"data: {"choices":[],"usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#;
        match parse_sse_line(line).unwrap() {
            SseEvent::Done(Some(usage)) => assert_eq!(usage.total_tokens, 15),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parse_done_marker() {
        assert!(matches!(parse_sse_line("data: [DONE]").unwrap(), SseEvent::Done(None)));
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        assert!(matches!(parse_sse_line("").unwrap(), SseEvent::Skip));
        assert!(matches!(parse_sse_line(": keep-alive").unwrap(), SseEvent::Skip));
        assert!(matches!(parse_sse_line("event: message").unwrap(), SseEvent::Skip));
    }

    #[test]
    fn malformed_data_is_an_error() {
        assert!(parse_sse_line("data: {not json").is_err());
    }

    #[test]
    fn parse_complete_response_with_reasoning() {
        let body = r#"{"model":"qwq","choices":[{"message":{"role":"assistant","content":"42","reasoning_content":"compute"}}],"usage":null}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        let choice = &parsed.choices[0];
        assert_eq!(choice.message.content.as_deref(), Some("42"));
        assert_eq!(choice.message.reasoning_content.as_deref(), Some("compute"));
    }
}
