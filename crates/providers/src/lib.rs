//! Language-model server clients for LocalChat.
//!
//! All providers implement the `localchat_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod ollama;
pub mod openai_compat;
pub mod router;
mod stream_lines;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
