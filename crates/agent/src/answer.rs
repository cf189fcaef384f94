//! Answer assembly.
//!
//! Turns a user message into a streamed assistant reply. With search
//! enabled the reply is grounded in a [`SearchAgent`] run; if anything on
//! that path fails the reply falls back to plain chat over the recent
//! history. Every change to the in-progress reply is pushed to a
//! [`DraftObserver`].

use std::sync::{Arc, Mutex};

use localchat_config::AppConfig;
use localchat_core::message::{Conversation, Message};
use localchat_core::provider::{Provider, ProviderRequest};
use localchat_core::search::SearchProvider;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::progress::{DraftObserver, ProgressListener, notify_draft};
use crate::prompts;
use crate::search_loop::SearchAgent;
use crate::streaming::{ChunkKind, StreamOutcome, drive_stream};

/// First line of the reasoning panel when search is on.
pub const SEARCH_MODE_HEADER: &str = "🔍 Search Mode Enabled\n\n";

const RULE_WIDTH: usize = 60;

/// The assistant message being built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantDraft {
    /// Visible answer text.
    pub content: String,
    /// Search trace followed by any model reasoning.
    pub reasoning: String,
    /// Queries issued by the search agent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_queries: Vec<String>,
    /// Per-attempt search metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_summary: Option<String>,
}

impl AssistantDraft {
    fn with_reasoning(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Self::default()
        }
    }

    fn push(&mut self, text: &str, kind: ChunkKind) {
        match kind {
            ChunkKind::Reasoning => self.reasoning.push_str(text),
            ChunkKind::Content => self.content.push_str(text),
        }
    }
}

/// How a reply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Finished,
    /// Stopped by the caller; the draft holds whatever arrived first.
    Cancelled,
    /// Generation failed; the draft content carries the error text.
    Failed { error: String },
}

/// A finished (or stopped) reply.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub draft: AssistantDraft,
    pub completion: Completion,
}

/// Mirrors loop progress into the draft and forwards it to the observer.
///
/// Keeps the latest trace so a failed run can still show how far it got.
struct TraceMirror<'a> {
    observer: &'a dyn DraftObserver,
    latest: Mutex<AssistantDraft>,
}

impl<'a> TraceMirror<'a> {
    fn new(observer: &'a dyn DraftObserver, draft: &AssistantDraft) -> Self {
        Self {
            observer,
            latest: Mutex::new(draft.clone()),
        }
    }

    fn into_draft(self) -> AssistantDraft {
        self.latest
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressListener for TraceMirror<'_> {
    fn on_progress(&self, trace: &str, queries: &[String]) {
        let mut draft = self.latest.lock().unwrap_or_else(|p| p.into_inner());
        draft.reasoning = format!("{SEARCH_MODE_HEADER}{trace}");
        draft.search_queries = queries.to_vec();
        notify_draft(self.observer, &draft);
    }
}

/// Header placed between the search trace and the answer model's reasoning.
fn final_reasoning_header(model: &str) -> String {
    let rule = "─".repeat(RULE_WIDTH);
    format!("\n\n{rule}\n💭 Final Answer Reasoning ({model}):\n{rule}\n\n")
}

/// Produces assistant replies, with or without web search.
pub struct Responder {
    provider: Arc<dyn Provider>,
    agent: SearchAgent,
    evaluator_model: String,
    history_window: usize,
    temperature: f32,
}

impl Responder {
    pub fn new(
        provider: Arc<dyn Provider>,
        search: Arc<dyn SearchProvider>,
        evaluator_model: impl Into<String>,
    ) -> Self {
        Self {
            agent: SearchAgent::new(Arc::clone(&provider), search),
            provider,
            evaluator_model: evaluator_model.into(),
            history_window: 11,
            temperature: 0.7,
        }
    }

    /// Build from the application config.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        search: Arc<dyn SearchProvider>,
        config: &AppConfig,
    ) -> Self {
        let mut responder = Self::new(provider, search, &config.agent.evaluator_model);
        responder.agent = responder
            .agent
            .with_config(&config.agent)
            .with_temperature(config.default_temperature);
        responder.history_window = config.chat.history_window;
        responder.temperature = config.default_temperature;
        responder
    }

    /// Messages of history sent with a plain reply.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn evaluator_model(&self) -> &str {
        &self.evaluator_model
    }

    /// Reply to `user_query`, the last user turn already in `history`.
    pub async fn respond(
        &self,
        history: &Conversation,
        user_query: &str,
        answer_model: &str,
        search_enabled: bool,
        cancel: &CancellationToken,
        observer: &dyn DraftObserver,
    ) -> AnswerOutcome {
        if !search_enabled {
            let (draft, completion) = self
                .generate_plain(AssistantDraft::default(), history, answer_model, cancel, observer)
                .await;
            return AnswerOutcome { draft, completion };
        }

        let mut draft = AssistantDraft::with_reasoning(SEARCH_MODE_HEADER);
        notify_draft(observer, &draft);

        match self
            .search_answer(&mut draft, user_query, answer_model, cancel, observer)
            .await
        {
            Ok(completion) => AnswerOutcome { draft, completion },
            Err(e) => {
                warn!(error = %e, "Search path failed, falling back to plain generation");
                draft.content.clear();
                draft.reasoning.push_str(&format!(
                    "\n❌ Search failed: {e}\n\nFalling back to regular generation...\n"
                ));
                notify_draft(observer, &draft);

                let (draft, completion) = self
                    .generate_plain(draft, history, answer_model, cancel, observer)
                    .await;
                AnswerOutcome { draft, completion }
            }
        }
    }

    async fn search_answer(
        &self,
        draft: &mut AssistantDraft,
        user_query: &str,
        answer_model: &str,
        cancel: &CancellationToken,
        observer: &dyn DraftObserver,
    ) -> Result<Completion, AgentError> {
        let mirror = TraceMirror::new(observer, draft);
        let run = self.agent.run(&self.evaluator_model, user_query, &mirror).await;
        *draft = mirror.into_draft();
        let result = run?;

        if !result.iterations.is_empty() {
            draft.search_summary = Some(result.summary());
        }
        notify_draft(observer, draft);

        let prompt = prompts::grounded_answer(user_query, &result.accumulated_context);
        let request = ProviderRequest::new(answer_model, vec![Message::user(prompt)])
            .with_temperature(self.temperature);

        info!(model = %answer_model, evidence_len = result.accumulated_context.len(), "Streaming grounded answer");

        let mut reasoning_started = false;
        let outcome = drive_stream(self.provider.as_ref(), request, cancel, |text, kind| {
            if kind == ChunkKind::Reasoning && !reasoning_started {
                draft.reasoning.push_str(&final_reasoning_header(answer_model));
                reasoning_started = true;
            }
            draft.push(text, kind);
            notify_draft(observer, draft);
        })
        .await
        .map_err(AgentError::Answer)?;

        Ok(match outcome {
            StreamOutcome::Completed => Completion::Finished,
            StreamOutcome::Cancelled => Completion::Cancelled,
        })
    }

    /// Stream a reply from the recent history alone.
    ///
    /// The history already ends with the user turn being answered.
    pub async fn generate_plain(
        &self,
        mut draft: AssistantDraft,
        history: &Conversation,
        model: &str,
        cancel: &CancellationToken,
        observer: &dyn DraftObserver,
    ) -> (AssistantDraft, Completion) {
        let messages = history.recent_context(self.history_window);
        let request = ProviderRequest::new(model, messages).with_temperature(self.temperature);

        info!(model = %model, "Streaming plain answer");

        let outcome = drive_stream(self.provider.as_ref(), request, cancel, |text, kind| {
            draft.push(text, kind);
            notify_draft(observer, &draft);
        })
        .await;

        let completion = match outcome {
            Ok(StreamOutcome::Completed) => Completion::Finished,
            Ok(StreamOutcome::Cancelled) => Completion::Cancelled,
            Err(e) => {
                warn!(error = %e, "Plain generation failed");
                draft.content = format!("Error: {e}");
                notify_draft(observer, &draft);
                Completion::Failed {
                    error: e.to_string(),
                }
            }
        };

        (draft, completion)
    }
}
