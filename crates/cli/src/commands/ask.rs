//! `localchat ask`: Answer a single question.

use localchat_agent::Completion;
use localchat_core::message::{Conversation, Message};
use tokio_util::sync::CancellationToken;

use super::Session;
use super::render::TerminalRenderer;

pub async fn run(
    question: String,
    search: bool,
    model: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::load(model)?;

    let mut conv = Conversation::new();
    conv.push(Message::user(&question));

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let renderer = TerminalRenderer::new(!json);
    let quiet = |_: &localchat_agent::AssistantDraft| {};
    let observer: &dyn localchat_agent::DraftObserver = if json { &quiet } else { &renderer };

    let outcome = session
        .responder
        .respond(&conv, &question, &session.answer_model, search, &cancel, observer)
        .await;
    watcher.abort();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.draft)?);
    } else {
        println!();
        if let Some(summary) = &outcome.draft.search_summary {
            eprintln!("\n{summary}");
        }
    }

    match outcome.completion {
        Completion::Finished => Ok(()),
        Completion::Cancelled => {
            eprintln!("\n  [Stopped]");
            Ok(())
        }
        Completion::Failed { error } => Err(error.into()),
    }
}
