//! # LocalChat Core
//!
//! Domain types, traits, and error definitions for the LocalChat client.
//! This crate has **no transport dependencies**; it defines the domain model
//! that the provider, search, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here:
//! - [`Provider`]: a language-model server (completion + streaming chat)
//! - [`SearchProvider`]: a web search backend
//!
//! Implementations live in their respective crates, which keeps the agent
//! loop testable with scripted stand-ins.

pub mod error;
pub mod message;
pub mod provider;
pub mod search;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, SearchError};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use search::{SearchProvider, SearchResponse, SearchResult};
