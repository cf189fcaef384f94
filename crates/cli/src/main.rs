//! LocalChat CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write a default config file
//! - `ask`: Answer a single question (web search on by default)
//! - `chat`: Interactive chat; Ctrl+C stops the current answer
//! - `models`: List models installed on the model server
//! - `doctor`: Check the model server, SearXNG, and the evaluator model

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "localchat",
    about = "LocalChat — search-augmented chat with local language models",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// Answer without searching the web
        #[arg(long)]
        no_search: bool,

        /// Override the answer model
        #[arg(short, long)]
        model: Option<String>,

        /// Print the final reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat
    Chat {
        /// Start with web search turned off
        #[arg(long)]
        no_search: bool,

        /// Override the answer model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List installed models
    Models,

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing (stderr, so answers on stdout stay clean)
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask {
            question,
            no_search,
            model,
            json,
        } => commands::ask::run(question, !no_search, model, json).await?,
        Commands::Chat { no_search, model } => commands::chat::run(!no_search, model).await?,
        Commands::Models => commands::models::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
