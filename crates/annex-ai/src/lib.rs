//! annex-ai: client for OpenAI-compatible chat-completions endpoints
//!
//! Speaks the `{model, messages, stream}` wire protocol against xAI's Grok
//! API (or any compatible endpoint) and exposes replies as an ordered
//! `StreamEvent` sequence, in both SSE-streaming and buffered form.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::Client;
pub use error::{Error, Result};
pub use stream::{ReplyStream, StreamEvent};
pub use types::{
    CompletionRequest, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, Role, WireMessage,
};
