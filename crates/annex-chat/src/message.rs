//! Conversation messages and their status machine

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle of a message.
///
/// User messages are `Complete` from creation. An assistant message starts
/// `Pending`, moves to `Streaming` on the first delta, and ends `Complete`
/// or `Error`. `Complete` and `Error` are terminal: the text is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Streaming,
    Complete,
    Error,
}

impl Status {
    /// Whether the message can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Error)
    }
}

/// A single chat message, mutated only by the owning reducer
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub status: Status,
    /// Creation time, unix millis
    pub timestamp: i64,
}

impl ChatMessage {
    /// A completed user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            status: Status::Complete,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// A pending assistant message awaiting its first delta
    pub fn assistant_pending() -> Self {
        Self {
            role: Role::Assistant,
            text: String::new(),
            status: Status::Pending,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
