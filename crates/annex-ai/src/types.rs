//! Wire types for the chat-completions protocol

use serde::{Deserialize, Serialize};

/// Default endpoint (xAI)
pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "grok-3";

/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Grok.";

/// Message roles on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single `{role, content}` message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
}

impl CompletionRequest {
    /// Build a single-turn request: system prompt plus one user message
    pub fn single_turn(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_text: impl Into<String>,
        stream: bool,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                WireMessage::new(Role::System, system_prompt),
                WireMessage::new(Role::User, user_text),
            ],
            stream,
        }
    }
}

// Buffered (stream=false) response types

#[derive(Debug, Deserialize)]
pub(crate) struct Completion {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    pub content: Option<String>,
}

// Streaming (stream=true) chunk types, one per SSE `data: ` line

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChoice {
    pub delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamDelta {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_roles_lowercase() {
        let req = CompletionRequest::single_turn("grok-3", "You are Grok.", "hi", true);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "grok-3");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are Grok.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_stream_chunk_decodes_delta_content() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"},"index":0}]}"#;
        let chunk: StreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hel"));
    }

    #[test]
    fn test_stream_chunk_tolerates_missing_content() {
        // Role-only first chunk and finish chunks carry no content
        let data = r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        let chunk: StreamChunk = serde_json::from_str(data).unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
    }

    #[test]
    fn test_completion_decodes_message_content() {
        let data = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#;
        let completion: Completion = serde_json::from_str(data).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("Hello!")
        );
    }
}
