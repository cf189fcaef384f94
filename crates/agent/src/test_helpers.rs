//! Shared test helpers for agent tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use localchat_core::error::{ProviderError, SearchError};
use localchat_core::message::Message;
use localchat_core::provider::{ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk};
use localchat_core::search::{SearchProvider, SearchResponse, SearchResult};

/// How one `stream()` call behaves.
pub enum StreamScript {
    /// Deliver the chunks, then the done marker.
    Chunks(Vec<StreamChunk>),
    /// Deliver the chunks, then stay open until the receiver is dropped.
    ChunksThenHang(Vec<StreamChunk>),
    /// Deliver the chunks, then an in-stream error.
    ChunksThenError(Vec<StreamChunk>, ProviderError),
    /// Refuse to open the stream.
    Fail(ProviderError),
}

/// A mock provider with scripted completions and streams.
///
/// Each call to `complete` returns the next scripted completion; each call
/// to `stream` plays the next stream script. Panics if a script runs dry.
pub struct ScriptedProvider {
    completions: Mutex<VecDeque<Result<String, ProviderError>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    complete_requests: Mutex<Vec<ProviderRequest>>,
    stream_requests: Mutex<Vec<ProviderRequest>>,
    producer_stopped: Arc<AtomicBool>,
}

impl ScriptedProvider {
    pub fn new(completions: Vec<Result<String, ProviderError>>, streams: Vec<StreamScript>) -> Self {
        Self {
            completions: Mutex::new(completions.into()),
            streams: Mutex::new(streams.into()),
            complete_requests: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
            producer_stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Only successful completions, no streams.
    pub fn completions(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect(), Vec::new())
    }

    /// Prompts sent to `complete`, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.complete_requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.messages.last().map(|m| m.content.clone()).unwrap_or_default())
            .collect()
    }

    /// Requests sent to `stream`, in order.
    pub fn stream_requests(&self) -> Vec<ProviderRequest> {
        self.stream_requests.lock().unwrap().clone()
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_requests.lock().unwrap().len()
    }

    /// Whether a hanging stream's producer noticed the receiver went away.
    pub fn producer_stopped(&self) -> bool {
        self.producer_stopped.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.complete_requests.lock().unwrap().push(request);
        let next = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more completions"));

        next.map(|text| ProviderResponse {
            message: Message::assistant(text),
            reasoning: None,
            usage: None,
            model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.stream_requests.lock().unwrap().push(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more streams"));

        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let stopped = Arc::clone(&self.producer_stopped);

        match script {
            StreamScript::Fail(e) => return Err(e),
            StreamScript::Chunks(chunks) => {
                tokio::spawn(async move {
                    for chunk in chunks {
                        if tx.send(Ok(chunk)).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(Ok(StreamChunk::done(None))).await;
                });
            }
            StreamScript::ChunksThenError(chunks, err) => {
                tokio::spawn(async move {
                    for chunk in chunks {
                        if tx.send(Ok(chunk)).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(Err(err)).await;
                });
            }
            StreamScript::ChunksThenHang(chunks) => {
                tokio::spawn(async move {
                    for chunk in chunks {
                        if tx.send(Ok(chunk)).await.is_err() {
                            break;
                        }
                    }
                    tx.closed().await;
                    stopped.store(true, Ordering::SeqCst);
                });
            }
        }

        Ok(rx)
    }
}

/// A mock search backend with scripted responses.
///
/// Once the script is used up, `repeat_error` (if set) is returned for
/// every further call; otherwise it panics.
pub struct ScriptedSearch {
    responses: Mutex<VecDeque<Result<Vec<SearchResult>, SearchError>>>,
    repeat_error: Option<SearchError>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new(responses: Vec<Result<Vec<SearchResult>, SearchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat_error: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A backend that fails every call.
    pub fn always_failing(err: SearchError) -> Self {
        Self {
            repeat_error: Some(err),
            ..Self::new(Vec::new())
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted_search"
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        self.queries.lock().unwrap().push(query.to_string());
        let next = self.responses.lock().unwrap().pop_front();
        let results = match (next, &self.repeat_error) {
            (Some(r), _) => r?,
            (None, Some(e)) => return Err(e.clone()),
            (None, None) => panic!("ScriptedSearch: no more responses"),
        };
        Ok(SearchResponse {
            query: query.to_string(),
            total_results: results.len() as u64,
            results,
        })
    }
}

/// `n` distinct search hits.
pub fn hits(n: usize) -> Vec<SearchResult> {
    (1..=n)
        .map(|i| {
            SearchResult::new(
                format!("Result {i}"),
                format!("https://example.com/{i}"),
                format!("Snippet {i}"),
                "mock",
            )
        })
        .collect()
}

pub fn paris_hit() -> SearchResult {
    SearchResult::new(
        "Paris - Wikipedia",
        "https://en.wikipedia.org/wiki/Paris",
        "Paris is the capital and largest city of France.",
        "wikipedia",
    )
}
