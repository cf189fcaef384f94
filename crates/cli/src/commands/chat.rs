//! `localchat chat`: Interactive chat mode.
//!
//! Lines starting with `/` are commands: `/search on`, `/search off`,
//! `/clear`. Ctrl+C while an answer is streaming stops that answer;
//! `exit` or end of input quits.

use std::io::Write;

use localchat_agent::{AssistantDraft, Completion};
use localchat_core::message::{Conversation, Message};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::Session;
use super::render::TerminalRenderer;

/// What a line of input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Search(bool),
    Clear,
    Unknown(&'a str),
    Message(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "exit" | "quit" | "/exit" | "/quit" => Input::Exit,
        "/search on" => Input::Search(true),
        "/search off" => Input::Search(false),
        "/clear" => Input::Clear,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        text => Input::Message(text),
    }
}

/// Store the reply in the transcript, with its search metadata.
fn assistant_message(draft: &AssistantDraft) -> Message {
    let mut message = Message::assistant(&draft.content);
    if !draft.reasoning.is_empty() {
        message
            .metadata
            .insert("reasoning".into(), draft.reasoning.clone().into());
    }
    if !draft.search_queries.is_empty() {
        message.metadata.insert(
            "search_queries".into(),
            serde_json::Value::from(draft.search_queries.clone()),
        );
    }
    if let Some(summary) = &draft.search_summary {
        message
            .metadata
            .insert("search_summary".into(), summary.clone().into());
    }
    message
}

pub async fn run(search: bool, model: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::load(model)?;
    let mut search_enabled = search;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║          LocalChat — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:   {}", session.config.default_provider);
    println!("  Model:      {}", session.answer_model);
    println!("  Evaluator:  {}", session.config.agent.evaluator_model);
    println!("  Search:     {}", if search_enabled { "on" } else { "off" });
    println!("  SearXNG:    {}", session.config.search.base_url);
    println!();
    println!("  Type your message and press Enter.");
    println!("  /search on|off toggles web search, /clear starts over.");
    println!("  Ctrl+C stops an answer; 'exit' quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conv = Conversation::new();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let text = match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::Search(on) => {
                search_enabled = on;
                println!("  Web search {}.", if on { "enabled" } else { "disabled" });
                continue;
            }
            Input::Clear => {
                conv = Conversation::new();
                println!("  Conversation cleared.");
                continue;
            }
            Input::Unknown(cmd) => {
                eprintln!("  Unknown command: {cmd}");
                continue;
            }
            Input::Message(text) => text.to_string(),
        };

        conv.push(Message::user(&text));

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        println!();
        let renderer = TerminalRenderer::new(true);
        let outcome = session
            .responder
            .respond(
                &conv,
                &text,
                &session.answer_model,
                search_enabled,
                &cancel,
                &renderer,
            )
            .await;
        watcher.abort();
        println!();

        match &outcome.completion {
            Completion::Finished => {
                if let Some(summary) = &outcome.draft.search_summary {
                    eprintln!("\n{summary}");
                }
            }
            Completion::Cancelled => eprintln!("  [Stopped]"),
            Completion::Failed { error } => {
                tracing::debug!(error = %error, "Answer failed");
            }
        }
        println!();

        conv.push(assistant_message(&outcome.draft));
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("/search off"), Input::Search(false));
        assert_eq!(parse_input("/search on\n"), Input::Search(true));
        assert_eq!(parse_input("/clear"), Input::Clear);
        assert_eq!(parse_input("/nope"), Input::Unknown("/nope"));
        assert_eq!(parse_input(" what is rust? "), Input::Message("what is rust?"));
    }

    #[test]
    fn assistant_message_keeps_search_metadata() {
        let draft = AssistantDraft {
            content: "Paris.".into(),
            reasoning: "🔍 Search Mode Enabled\n\n".into(),
            search_queries: vec!["capital of France".into()],
            search_summary: Some("Search 1: \"capital of France\"".into()),
        };
        let msg = assistant_message(&draft);
        assert_eq!(msg.content, "Paris.");
        assert_eq!(msg.metadata["search_queries"][0], "capital of France");
        assert!(msg.metadata.contains_key("reasoning"));
        assert!(msg.metadata.contains_key("search_summary"));
    }

    #[test]
    fn plain_reply_has_no_metadata() {
        let msg = assistant_message(&AssistantDraft {
            content: "hi".into(),
            ..AssistantDraft::default()
        });
        assert!(msg.metadata.is_empty());
    }
}
