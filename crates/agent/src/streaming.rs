//! Consuming a provider stream with cancellation.

use localchat_core::error::ProviderError;
use localchat_core::provider::{Provider, ProviderRequest};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Which channel a streamed piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Reasoning,
    Content,
}

/// How a stream ended, when it didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
}

/// Stream `request` from `provider`, handing each text piece to `on_chunk`.
///
/// Cancelling `cancel` stops delivery immediately and drops the chunk
/// receiver, which ends the provider's producer task on its next send.
/// Nothing is delivered after cancellation is observed.
pub async fn drive_stream<F>(
    provider: &dyn Provider,
    mut request: ProviderRequest,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> Result<StreamOutcome, ProviderError>
where
    F: FnMut(&str, ChunkKind),
{
    if cancel.is_cancelled() {
        return Ok(StreamOutcome::Cancelled);
    }

    request.stream = true;
    let mut rx = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
        opened = provider.stream(request) => opened?,
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Stream cancelled");
                return Ok(StreamOutcome::Cancelled);
            }
            next = rx.recv() => next,
        };

        let chunk = match next {
            Some(chunk) => chunk?,
            None => return Ok(StreamOutcome::Completed),
        };

        if let Some(reasoning) = chunk.reasoning.as_deref().filter(|r| !r.is_empty()) {
            on_chunk(reasoning, ChunkKind::Reasoning);
        }
        if let Some(content) = chunk.content.as_deref().filter(|c| !c.is_empty()) {
            on_chunk(content, ChunkKind::Content);
        }
        if chunk.done {
            return Ok(StreamOutcome::Completed);
        }
    }
}
