//! Incremental terminal rendering of an assistant draft.

use std::io::Write;
use std::sync::Mutex;

use localchat_agent::{AssistantDraft, DraftObserver, TextDelta, diff_text};

/// Prints only what changed since the last snapshot.
///
/// Reasoning goes to stderr, the answer to stdout.
pub struct TerminalRenderer {
    show_reasoning: bool,
    printed: Mutex<Printed>,
}

#[derive(Default)]
struct Printed {
    reasoning: String,
    content: String,
}

impl TerminalRenderer {
    pub fn new(show_reasoning: bool) -> Self {
        Self {
            show_reasoning,
            printed: Mutex::new(Printed::default()),
        }
    }
}

impl DraftObserver for TerminalRenderer {
    fn on_draft(&self, draft: &AssistantDraft) {
        let mut printed = self.printed.lock().unwrap_or_else(|p| p.into_inner());

        if self.show_reasoning
            && let Some(new) = unseen(&draft.reasoning, &mut printed.reasoning)
        {
            eprint!("{new}");
        }

        if let Some(new) = unseen(&draft.content, &mut printed.content) {
            print!("{new}");
            let _ = std::io::stdout().flush();
        }
    }
}

/// What to print so the terminal shows `text`, given what is already shown.
///
/// Rewritten text (a discarded partial answer) starts over on a new line.
fn unseen(text: &str, printed: &mut String) -> Option<String> {
    match diff_text(text, printed) {
        TextDelta::Unchanged => None,
        TextDelta::Appended(new) => Some(new),
        TextDelta::Replaced(new) => Some(format!("\n{new}")),
    }
}
