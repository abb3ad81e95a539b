//! Session event types

use crate::message::ChatMessage;

/// Events broadcast while a turn is driven.
///
/// Snapshots are owned clones: subscribers render from them and never
/// touch the reducer's conversation directly.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A turn began; carries the user message and the pending assistant slot
    TurnStarted {
        user: ChatMessage,
        assistant: ChatMessage,
    },
    /// The in-flight assistant message changed
    MessageUpdate { snapshot: ChatMessage },
    /// The turn reached a terminal state (complete, error, or cancelled)
    TurnEnded { snapshot: ChatMessage },
}

impl SessionEvent {
    /// Check if this event ends a turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::TurnEnded { .. })
    }
}
