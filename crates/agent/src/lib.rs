//! The search-augmented answer agent.
//!
//! For a user question the agent runs a short **query → search → evaluate**
//! loop against a small evaluator model:
//!
//! 1. **Generate** a web search query (refined from the previous attempt)
//! 2. **Search** SearXNG and keep the top hits as evidence
//! 3. **Evaluate** whether the evidence answers the question (`CONFIDENCE: 0-100`)
//! 4. **Stop** on high confidence, no progress, or the attempt limit
//!
//! The [`Responder`] then streams a final answer grounded in the evidence,
//! falling back to plain chat if anything on the search path fails.

pub mod answer;
pub mod confidence;
pub mod error;
pub mod progress;
pub mod prompts;
pub mod search_loop;
pub mod stream_event;
pub mod streaming;

#[cfg(test)]
mod test_helpers;

pub use answer::{AnswerOutcome, AssistantDraft, Completion, Responder};
pub use confidence::{Evaluation, parse_confidence};
pub use error::{AgentError, IterationError};
pub use progress::{ChannelListener, DraftObserver, ProgressListener, TextDelta, diff_text};
pub use search_loop::{AgentResult, SearchAgent, SearchIteration};
pub use stream_event::AgentStreamEvent;
pub use streaming::{ChunkKind, StreamOutcome, drive_stream};
