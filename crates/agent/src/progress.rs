//! Progress notification.
//!
//! The search loop reports every change to its reasoning trace through a
//! [`ProgressListener`]; answer assembly reports every change to the
//! assistant draft through a [`DraftObserver`]. Both are plain synchronous
//! callbacks. A panicking callback is logged and ignored so a broken front
//! end can't take the answer down with it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use crate::answer::{AssistantDraft, Completion};
use crate::stream_event::AgentStreamEvent;

/// Receives the full reasoning trace and query list after each change.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, trace: &str, queries: &[String]);
}

impl<F> ProgressListener for F
where
    F: Fn(&str, &[String]) + Send + Sync,
{
    fn on_progress(&self, trace: &str, queries: &[String]) {
        self(trace, queries)
    }
}

/// Receives a snapshot of the assistant draft after each change.
pub trait DraftObserver: Send + Sync {
    fn on_draft(&self, draft: &AssistantDraft);
}

impl<F> DraftObserver for F
where
    F: Fn(&AssistantDraft) + Send + Sync,
{
    fn on_draft(&self, draft: &AssistantDraft) {
        self(draft)
    }
}

/// Forwards agent activity as [`AgentStreamEvent`]s over an unbounded channel.
///
/// As a [`ProgressListener`] it sends trace snapshots; as a
/// [`DraftObserver`] it sends only the newly appended reasoning and answer
/// text, or a `Replace*` event when earlier text was rewritten. A closed
/// receiver is not an error; events are simply dropped.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<AgentStreamEvent>,
    sent: Mutex<Sent>,
}

#[derive(Default)]
struct Sent {
    reasoning: String,
    content: String,
}

impl ChannelListener {
    pub fn new(tx: mpsc::UnboundedSender<AgentStreamEvent>) -> Self {
        Self {
            tx,
            sent: Mutex::new(Sent::default()),
        }
    }

    /// A listener plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AgentStreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Send the closing event for a reply.
    pub fn finish(&self, completion: &Completion) {
        let event = match completion {
            Completion::Finished => AgentStreamEvent::Done { cancelled: false },
            Completion::Cancelled => AgentStreamEvent::Done { cancelled: true },
            Completion::Failed { error } => AgentStreamEvent::Error {
                message: error.clone(),
            },
        };
        let _ = self.tx.send(event);
    }
}

impl ProgressListener for ChannelListener {
    fn on_progress(&self, trace: &str, queries: &[String]) {
        let _ = self.tx.send(AgentStreamEvent::Progress {
            trace: trace.to_string(),
            queries: queries.to_vec(),
        });
    }
}

impl DraftObserver for ChannelListener {
    fn on_draft(&self, draft: &AssistantDraft) {
        let mut sent = self.sent.lock().unwrap_or_else(|p| p.into_inner());

        match diff_text(&draft.reasoning, &mut sent.reasoning) {
            TextDelta::Unchanged => {}
            TextDelta::Appended(content) => {
                let _ = self.tx.send(AgentStreamEvent::Reasoning { content });
            }
            TextDelta::Replaced(content) => {
                let _ = self.tx.send(AgentStreamEvent::ReplaceReasoning { content });
            }
        }
        match diff_text(&draft.content, &mut sent.content) {
            TextDelta::Unchanged => {}
            TextDelta::Appended(content) => {
                let _ = self.tx.send(AgentStreamEvent::Chunk { content });
            }
            TextDelta::Replaced(content) => {
                let _ = self.tx.send(AgentStreamEvent::ReplaceContent { content });
            }
        }
    }
}

/// How a draft field changed since it was last forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextDelta {
    Unchanged,
    /// New text was added after what was already forwarded.
    Appended(String),
    /// The forwarded text is no longer a prefix; this is the whole new text.
    Replaced(String),
}

/// Compare `text` with what was already forwarded and remember it.
pub fn diff_text(text: &str, sent: &mut String) -> TextDelta {
    if text == sent.as_str() {
        return TextDelta::Unchanged;
    }
    let delta = match text.strip_prefix(sent.as_str()) {
        Some(tail) => TextDelta::Appended(tail.to_string()),
        None => TextDelta::Replaced(text.to_string()),
    };
    sent.clear();
    sent.push_str(text);
    delta
}

pub(crate) fn notify_progress(listener: &dyn ProgressListener, trace: &str, queries: &[String]) {
    if catch_unwind(AssertUnwindSafe(|| listener.on_progress(trace, queries))).is_err() {
        warn!("Progress listener panicked; continuing");
    }
}

pub(crate) fn notify_draft(observer: &dyn DraftObserver, draft: &AssistantDraft) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_draft(draft))).is_err() {
        warn!("Draft observer panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closure_listener_receives_snapshot() {
        let seen = Mutex::new(Vec::new());
        let listener = |trace: &str, queries: &[String]| {
            seen.lock().unwrap().push((trace.to_string(), queries.len()));
        };
        notify_progress(&listener, "🔍 Search 1: x\n", &["x".to_string()]);
        assert_eq!(seen.lock().unwrap()[0], ("🔍 Search 1: x\n".to_string(), 1));
    }

    #[test]
    fn panicking_listener_is_contained() {
        fn exploding(_: &str, _: &[String]) {
            panic!("front end exploded");
        }
        notify_progress(&exploding, "trace", &[]);
    }

    #[test]
    fn panicking_observer_is_contained() {
        fn exploding(_: &AssistantDraft) {
            panic!("render failed");
        }
        notify_draft(&exploding, &AssistantDraft::default());
    }

    #[tokio::test]
    async fn channel_listener_forwards_events() {
        let (listener, mut rx) = ChannelListener::channel();
        listener.on_progress("a", &["q1".to_string()]);
        listener.on_progress("ab", &["q1".to_string()]);

        assert_eq!(
            rx.recv().await,
            Some(AgentStreamEvent::Progress {
                trace: "a".into(),
                queries: vec!["q1".into()]
            })
        );
        match rx.recv().await {
            Some(AgentStreamEvent::Progress { trace, .. }) => assert_eq!(trace, "ab"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn channel_listener_sends_draft_deltas() {
        let (listener, mut rx) = ChannelListener::channel();
        let mut draft = AssistantDraft {
            reasoning: "think".into(),
            ..AssistantDraft::default()
        };
        listener.on_draft(&draft);
        draft.content.push_str("Par");
        listener.on_draft(&draft);
        draft.content.push_str("is");
        listener.on_draft(&draft);
        listener.finish(&Completion::Finished);
        drop(listener);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                AgentStreamEvent::Reasoning {
                    content: "think".into()
                },
                AgentStreamEvent::Chunk {
                    content: "Par".into()
                },
                AgentStreamEvent::Chunk {
                    content: "is".into()
                },
                AgentStreamEvent::Done { cancelled: false },
            ]
        );
    }

    #[test]
    fn diff_text_appends_and_replaces() {
        let mut sent = String::new();
        assert_eq!(diff_text("Hel", &mut sent), TextDelta::Appended("Hel".into()));
        assert_eq!(diff_text("Hello", &mut sent), TextDelta::Appended("lo".into()));
        assert_eq!(diff_text("Hello", &mut sent), TextDelta::Unchanged);
        assert_eq!(diff_text("", &mut sent), TextDelta::Replaced(String::new()));
        assert_eq!(sent, "");
    }

    #[test]
    fn diff_text_replaces_longer_rewrite() {
        let mut sent = "Hel".to_string();
        assert_eq!(
            diff_text("Error: Stream interrupted: reset", &mut sent),
            TextDelta::Replaced("Error: Stream interrupted: reset".into())
        );
        assert_eq!(sent, "Error: Stream interrupted: reset");
    }

    #[tokio::test]
    async fn channel_listener_replaces_rewritten_answer() {
        let (listener, mut rx) = ChannelListener::channel();
        let mut draft = AssistantDraft {
            content: "Hel".into(),
            ..AssistantDraft::default()
        };
        listener.on_draft(&draft);
        draft.content = "Error: Stream interrupted: reset".into();
        listener.on_draft(&draft);
        drop(listener);

        // A consumer that appends chunks and resets on replace sees the real reply.
        let mut shown = String::new();
        while let Some(event) = rx.recv().await {
            match event {
                AgentStreamEvent::Chunk { content } => shown.push_str(&content),
                AgentStreamEvent::ReplaceContent { content } => shown = content,
                other => panic!("unexpected: {other:?}"),
            }
        }
        assert_eq!(shown, "Error: Stream interrupted: reset");
    }

    #[test]
    fn channel_listener_tolerates_closed_receiver() {
        let (listener, rx) = ChannelListener::channel();
        drop(rx);
        listener.on_progress("still fine", &[]);
    }
}
