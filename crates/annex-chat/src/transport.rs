//! Transport abstraction over the completion endpoint.
//!
//! One trait, two implementations: real SSE streaming, and a buffered call
//! replayed as a single delta. Both satisfy the same reducer contract, so
//! which one runs is purely a configuration choice.

use async_stream::stream;
use async_trait::async_trait;

use annex_ai::{
    Client, CompletionRequest, Result, StreamEvent,
    stream::ReplyStream,
    types::{DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT},
};

/// Request parameters shared by both transports
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub system_prompt: String,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Produces the reply event stream for one submitted message.
///
/// Each call is a single request/response pair; implementations release
/// the underlying connection when the returned stream is dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, user_text: &str) -> Result<ReplyStream>;
}

/// SSE streaming transport (stream=true)
pub struct StreamingTransport {
    client: Client,
    options: ChatOptions,
}

impl StreamingTransport {
    pub fn new(client: Client, options: ChatOptions) -> Self {
        Self { client, options }
    }
}

#[async_trait]
impl Transport for StreamingTransport {
    async fn send(&self, user_text: &str) -> Result<ReplyStream> {
        let request = CompletionRequest::single_turn(
            &self.options.model,
            &self.options.system_prompt,
            user_text,
            true,
        );
        self.client.stream(request)
    }
}

/// Buffered transport (stream=false): the whole reply arrives at once and
/// is replayed as one delta followed by `Done`.
pub struct BufferedTransport {
    client: Client,
    options: ChatOptions,
}

impl BufferedTransport {
    pub fn new(client: Client, options: ChatOptions) -> Self {
        Self { client, options }
    }
}

#[async_trait]
impl Transport for BufferedTransport {
    async fn send(&self, user_text: &str) -> Result<ReplyStream> {
        let request = CompletionRequest::single_turn(
            &self.options.model,
            &self.options.system_prompt,
            user_text,
            false,
        );
        let text = self.client.complete(request).await?;
        Ok(replay_buffered(text))
    }
}

/// Replay a buffered reply as the event sequence streaming would produce:
/// one delta carrying the whole text, then `Done`. An empty reply is just
/// `Done`.
fn replay_buffered(text: String) -> ReplyStream {
    Box::pin(stream! {
        if !text.is_empty() {
            yield StreamEvent::Delta(text);
        }
        yield StreamEvent::Done;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_buffered_replay_shape() {
        // One Delta followed by Done, exactly what the reducer contract
        // expects from a streaming transport.
        let mut replay = replay_buffered("Hello!".to_string());

        assert_eq!(
            replay.next().await,
            Some(StreamEvent::Delta("Hello!".into()))
        );
        assert_eq!(replay.next().await, Some(StreamEvent::Done));
        assert_eq!(replay.next().await, None);
    }

    #[tokio::test]
    async fn test_buffered_replay_of_empty_reply() {
        // No empty delta; the reply goes straight to Done
        let mut replay = replay_buffered(String::new());

        assert_eq!(replay.next().await, Some(StreamEvent::Done));
        assert_eq!(replay.next().await, None);
    }

    #[test]
    fn test_default_options() {
        let options = ChatOptions::default();
        assert_eq!(options.model, "grok-3");
        assert_eq!(options.system_prompt, "You are Grok.");
    }
}
