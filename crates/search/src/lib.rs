//! # LocalChat Search
//!
//! Web search for the answer agent: a SearXNG client implementing
//! [`SearchProvider`](localchat_core::SearchProvider) and the formatter
//! that turns hits into prompt-ready text.

pub mod format;
pub mod searxng;

pub use format::{NO_RESULTS, format_results};
pub use searxng::SearxngProvider;
