//! Chat-completions client: buffered and SSE-streaming calls

use async_stream::stream;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};

use crate::{
    error::{Error, Result},
    stream::{ReplyStream, StreamEvent},
    types::{Completion, CompletionRequest, DEFAULT_BASE_URL, StreamChunk},
};

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl Client {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `XAI_API_KEY` environment variable.
    ///
    /// Absence is a visible error, reported before any request is made.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("XAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the endpoint base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stream a reply as server-sent events.
    ///
    /// Each `data: ` line decodes to a `Delta`; a literal `data: [DONE]`
    /// line (or the server closing the stream) yields `Done`. Malformed
    /// chunk lines are skipped, not fatal.
    pub fn stream(&self, request: CompletionRequest) -> Result<ReplyStream> {
        let url = format!("{}/chat/completions", self.base_url);
        let builder = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request);

        let event_source = EventSource::new(builder)
            .map_err(|e| Error::Sse(format!("failed to create event source: {}", e)))?;

        Ok(Box::pin(decode_sse(event_source)))
    }

    /// Buffered (stream=false) call; returns the full reply text
    pub async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: Completion = response.json().await?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Outcome of decoding one SSE `data:` line
#[derive(Debug, PartialEq, Eq)]
enum DataLine {
    /// Deltas carried by the line; empty when the line was skipped
    Deltas(Vec<StreamEvent>),
    /// The `[DONE]` sentinel
    Done,
}

/// Decode one `data:` line: the `[DONE]` sentinel ends the reply, a
/// malformed chunk line is skipped and the stream continues.
fn decode_data_line(data: &str) -> DataLine {
    if data == "[DONE]" {
        return DataLine::Done;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => DataLine::Deltas(
            chunk
                .choices
                .into_iter()
                .filter_map(|choice| choice.delta.content)
                .filter(|content| !content.is_empty())
                .map(StreamEvent::Delta)
                .collect(),
        ),
        Err(e) => {
            // Forgiving decode: skip the line, keep the stream
            tracing::debug!("skipping undecodable stream chunk: {}", e);
            DataLine::Deltas(Vec::new())
        }
    }
}

fn decode_sse(mut event_source: EventSource) -> impl futures::Stream<Item = StreamEvent> {
    stream! {
        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    match decode_data_line(&msg.data) {
                        DataLine::Done => {
                            yield StreamEvent::Done;
                            return;
                        }
                        DataLine::Deltas(deltas) => {
                            for delta in deltas {
                                yield delta;
                            }
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    yield StreamEvent::Done;
                    return;
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let body = response.text().await.unwrap_or_default();
                    yield StreamEvent::Error(
                        Error::Api { status: status.as_u16(), body }.to_string(),
                    );
                    return;
                }
                Err(e) => {
                    yield StreamEvent::Error(Error::Sse(e.to_string()).to_string());
                    return;
                }
            }
        }
        // Server closed without [DONE]; the reply we have is the reply
        yield StreamEvent::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_sentinel_ends_the_reply() {
        assert_eq!(decode_data_line("[DONE]"), DataLine::Done);
    }

    #[test]
    fn test_malformed_chunk_line_is_skipped() {
        let lines = [
            r#"{"choices":[{"delta":{"content":"Hel"},"index":0}]}"#,
            "this is not a chunk {",
            r#"{"choices":[{"delta":{"content":"lo"},"index":0}]}"#,
        ];

        let mut events = Vec::new();
        for line in lines {
            match decode_data_line(line) {
                DataLine::Deltas(deltas) => events.extend(deltas),
                DataLine::Done => events.push(StreamEvent::Done),
            }
        }

        // The bad line contributes nothing and deltas keep flowing
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".into()),
                StreamEvent::Delta("lo".into()),
            ]
        );
    }

    #[test]
    fn test_empty_delta_content_is_dropped() {
        let line = r#"{"choices":[{"delta":{"content":""},"index":0}]}"#;
        assert_eq!(decode_data_line(line), DataLine::Deltas(vec![]));

        let line = r#"{"choices":[{"delta":{},"index":0}]}"#;
        assert_eq!(decode_data_line(line), DataLine::Deltas(vec![]));
    }
}
