//! Agent-level streaming events.
//!
//! `AgentStreamEvent` is what a front end consumes while a search-augmented
//! answer is in flight: loop progress, answer tokens, and the final status.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent during execution.
///
/// - `progress`: the reasoning trace grew
/// - `reasoning`: partial reasoning token from the answer model
/// - `chunk`: partial answer token
/// - `replace_reasoning` / `replace_content`: text sent so far was discarded
/// - `done`: the answer is complete (or was cancelled)
/// - `error`: the answer failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Snapshot of the reasoning trace and the queries issued so far.
    Progress { trace: String, queries: Vec<String> },

    /// Partial reasoning token.
    Reasoning { content: String },

    /// Partial answer token.
    Chunk { content: String },

    /// Replaces all reasoning sent so far.
    ReplaceReasoning { content: String },

    /// Replaces all answer text sent so far, e.g. when a failed partial
    /// answer gives way to a fallback reply or an error line.
    ReplaceContent { content: String },

    /// The stream is complete.
    Done { cancelled: bool },

    /// An error occurred.
    Error { message: String },
}

impl AgentStreamEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Reasoning { .. } => "reasoning",
            Self::Chunk { .. } => "chunk",
            Self::ReplaceReasoning { .. } => "replace_reasoning",
            Self::ReplaceContent { .. } => "replace_content",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
