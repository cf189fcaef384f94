//! Agent error types.

use localchat_core::error::{ProviderError, SearchError};
use thiserror::Error;

/// Failures that end a search-augmented answer.
///
/// Any of these sends the [`Responder`](crate::Responder) down the plain
/// chat fallback.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The evaluator model could not produce a search query.
    #[error("Query generation failed: {0}")]
    QueryGeneration(#[source] ProviderError),

    /// The final answer stream failed before completing.
    #[error("Answer generation failed: {0}")]
    Answer(#[source] ProviderError),
}

/// A failure inside one search iteration.
///
/// Recorded in the reasoning trace; ends the loop with whatever was
/// gathered so far.
#[derive(Debug, Error)]
pub enum IterationError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Evaluation(#[from] ProviderError),
}
