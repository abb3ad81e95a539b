//! The streaming-reply reducer.
//!
//! Folds `StreamEvent`s from a completion transport into `ChatMessage`
//! state transitions, independent of the transport and of how the
//! conversation is rendered.

use annex_ai::StreamEvent;

use crate::error::ProtocolViolation;
use crate::message::{ChatMessage, Status};

/// Handle for the turn created by [`Reducer::start`].
///
/// Carries a generation id so events from an earlier turn can never be
/// applied to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnHandle {
    id: u64,
    assistant: usize,
}

/// Owns the conversation and applies stream events to the in-flight turn.
///
/// Invariant: the in-flight assistant message's text is always the
/// concatenation, in arrival order, of every non-empty delta received for
/// its turn. It never shrinks or reorders. Once a message is `Complete` or
/// `Error` it is frozen.
#[derive(Debug, Default)]
pub struct Reducer {
    messages: Vec<ChatMessage>,
    active: Option<u64>,
    next_turn: u64,
}

impl Reducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, in conversation order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a turn is currently pending or streaming
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// The assistant message owned by `handle`, if the indices are sane
    pub fn assistant(&self, handle: &TurnHandle) -> Option<&ChatMessage> {
        self.messages.get(handle.assistant)
    }

    /// Drop the whole conversation. No-op while a turn is in flight.
    pub fn clear(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.messages.clear();
        true
    }

    /// Begin a turn: append the user message (complete) and an empty
    /// pending assistant message.
    ///
    /// Returns `None` without touching the conversation when `user_text`
    /// is blank or a turn is already in flight.
    pub fn start(&mut self, user_text: &str) -> Option<TurnHandle> {
        if user_text.trim().is_empty() || self.active.is_some() {
            return None;
        }

        let id = self.next_turn;
        self.next_turn += 1;

        self.messages.push(ChatMessage::user(user_text));
        self.messages.push(ChatMessage::assistant_pending());
        self.active = Some(id);

        Some(TurnHandle {
            id,
            assistant: self.messages.len() - 1,
        })
    }

    /// Apply one stream event to the turn owned by `handle`.
    ///
    /// Events after a terminal state (or on a stale handle) are a
    /// [`ProtocolViolation`].
    pub fn on_event(
        &mut self,
        handle: &TurnHandle,
        event: StreamEvent,
    ) -> Result<(), ProtocolViolation> {
        if self.active != Some(handle.id) {
            return Err(ProtocolViolation { turn: handle.id });
        }

        let message = &mut self.messages[handle.assistant];
        match event {
            StreamEvent::Delta(fragment) => {
                if fragment.is_empty() {
                    return Ok(());
                }
                message.status = Status::Streaming;
                message.text.push_str(&fragment);
            }
            StreamEvent::Done => {
                message.status = Status::Complete;
                self.active = None;
            }
            StreamEvent::Error(msg) => {
                message.text = format!("Error: {}", msg);
                message.status = Status::Error;
                self.active = None;
            }
        }
        Ok(())
    }

    /// Cancel the turn owned by `handle`.
    ///
    /// Valid only while pending/streaming; repeated cancels are no-ops.
    /// Returns `true` when this call performed the transition.
    pub fn cancel(&mut self, handle: &TurnHandle) -> bool {
        if self.active != Some(handle.id) {
            return false;
        }
        let message = &mut self.messages[handle.assistant];
        message.text = "Cancelled.".to_string();
        message.status = Status::Error;
        self.active = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    fn delta(s: &str) -> StreamEvent {
        StreamEvent::Delta(s.to_string())
    }

    #[test]
    fn test_deltas_then_done_concatenate_in_order() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("Hello").unwrap();

        reducer.on_event(&turn, delta("Hi")).unwrap();
        reducer.on_event(&turn, delta(" there")).unwrap();
        reducer.on_event(&turn, StreamEvent::Done).unwrap();

        let assistant = reducer.assistant(&turn).unwrap();
        assert_eq!(assistant.text, "Hi there");
        assert_eq!(assistant.status, Status::Complete);
        assert!(!reducer.is_busy());
    }

    #[test]
    fn test_many_fragments_preserve_arrival_order() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("count").unwrap();
        for i in 0..50 {
            reducer.on_event(&turn, delta(&format!("{},", i))).unwrap();
        }
        reducer.on_event(&turn, StreamEvent::Done).unwrap();

        let expected: String = (0..50).map(|i| format!("{},", i)).collect();
        assert_eq!(reducer.assistant(&turn).unwrap().text, expected);
    }

    #[test]
    fn test_start_appends_user_and_pending_assistant() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("  Hello  ").unwrap();

        assert_eq!(reducer.messages().len(), 2);
        assert_eq!(reducer.messages()[0].role, Role::User);
        assert_eq!(reducer.messages()[0].status, Status::Complete);
        assert_eq!(reducer.messages()[1].role, Role::Assistant);
        assert_eq!(reducer.messages()[1].status, Status::Pending);
        assert!(reducer.is_busy());
        assert!(reducer.assistant(&turn).unwrap().text.is_empty());
    }

    #[test]
    fn test_start_blank_input_is_a_noop() {
        let mut reducer = Reducer::new();
        assert!(reducer.start("").is_none());
        assert!(reducer.start("   ").is_none());
        assert!(reducer.start("\n\t").is_none());
        assert!(reducer.messages().is_empty());
        assert!(!reducer.is_busy());
    }

    #[test]
    fn test_start_while_in_flight_is_a_noop() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("first").unwrap();

        // Pending
        assert!(reducer.start("second").is_none());
        assert_eq!(reducer.messages().len(), 2);

        // Streaming
        reducer.on_event(&turn, delta("x")).unwrap();
        assert!(reducer.start("second").is_none());
        assert_eq!(reducer.messages().len(), 2);

        // After completion a new turn is allowed
        reducer.on_event(&turn, StreamEvent::Done).unwrap();
        assert!(reducer.start("second").is_some());
        assert_eq!(reducer.messages().len(), 4);
    }

    #[test]
    fn test_empty_delta_is_a_noop() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();

        reducer.on_event(&turn, delta("")).unwrap();
        let assistant = reducer.assistant(&turn).unwrap();
        // Still pending: an empty fragment does not begin streaming
        assert_eq!(assistant.status, Status::Pending);
        assert!(assistant.text.is_empty());

        reducer.on_event(&turn, delta("a")).unwrap();
        reducer.on_event(&turn, delta("")).unwrap();
        assert_eq!(reducer.assistant(&turn).unwrap().text, "a");
    }

    #[test]
    fn test_first_delta_moves_pending_to_streaming() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();
        reducer.on_event(&turn, delta("H")).unwrap();
        assert_eq!(reducer.assistant(&turn).unwrap().status, Status::Streaming);
    }

    #[test]
    fn test_error_replaces_text_and_is_terminal() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("X").unwrap();
        reducer.on_event(&turn, delta("partial")).unwrap();
        reducer
            .on_event(&turn, StreamEvent::Error("rate limited".into()))
            .unwrap();

        let assistant = reducer.assistant(&turn).unwrap();
        assert_eq!(assistant.status, Status::Error);
        assert!(assistant.text.contains("rate limited"));
        // Partial reply text was replaced by the indicator
        assert!(!assistant.text.contains("partial"));
        assert!(!reducer.is_busy());
    }

    #[test]
    fn test_delta_after_error_is_protocol_violation() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("X").unwrap();
        reducer
            .on_event(&turn, StreamEvent::Error("boom".into()))
            .unwrap();

        let err = reducer.on_event(&turn, delta("late")).unwrap_err();
        assert!(err.to_string().contains("protocol violation"));
        // The late delta was not applied
        assert!(!reducer.assistant(&turn).unwrap().text.contains("late"));
    }

    #[test]
    fn test_event_after_done_is_protocol_violation() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();
        reducer.on_event(&turn, StreamEvent::Done).unwrap();

        assert!(reducer.on_event(&turn, delta("x")).is_err());
        assert!(reducer.on_event(&turn, StreamEvent::Done).is_err());
    }

    #[test]
    fn test_stale_handle_is_protocol_violation() {
        let mut reducer = Reducer::new();
        let first = reducer.start("one").unwrap();
        reducer.on_event(&first, StreamEvent::Done).unwrap();
        let _second = reducer.start("two").unwrap();

        // Events for the finished turn must not touch the new one
        assert!(reducer.on_event(&first, delta("ghost")).is_err());
    }

    #[test]
    fn test_cancel_during_streaming() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();
        reducer.on_event(&turn, delta("par")).unwrap();

        assert!(reducer.cancel(&turn));
        let assistant = reducer.assistant(&turn).unwrap();
        assert_eq!(assistant.status, Status::Error);
        assert!(assistant.text.contains("Cancelled"));
        assert!(!reducer.is_busy());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();
        assert!(reducer.cancel(&turn));
        assert!(!reducer.cancel(&turn));
        assert!(!reducer.cancel(&turn));
        assert_eq!(reducer.assistant(&turn).unwrap().status, Status::Error);
    }

    #[test]
    fn test_cancel_after_done_is_a_noop() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();
        reducer.on_event(&turn, delta("done text")).unwrap();
        reducer.on_event(&turn, StreamEvent::Done).unwrap();

        assert!(!reducer.cancel(&turn));
        let assistant = reducer.assistant(&turn).unwrap();
        assert_eq!(assistant.status, Status::Complete);
        assert_eq!(assistant.text, "done text");
    }

    #[test]
    fn test_clear_refused_while_turn_in_flight() {
        let mut reducer = Reducer::new();
        let turn = reducer.start("hi").unwrap();
        reducer.on_event(&turn, delta("par")).unwrap();

        assert!(!reducer.clear());
        assert_eq!(reducer.messages().len(), 2);

        reducer.on_event(&turn, StreamEvent::Done).unwrap();
        assert!(reducer.clear());
        assert!(reducer.messages().is_empty());
    }
}
