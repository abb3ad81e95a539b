//! Streaming event types

use std::pin::Pin;
use tokio_stream::Stream;

/// Events produced while consuming a completion reply, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental text fragment
    Delta(String),
    /// The reply finished successfully
    Done,
    /// The reply failed; message carried verbatim
    Error(String),
}

impl StreamEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }
}

/// A stream of reply events
pub type ReplyStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::Error("boom".into()).is_terminal());
        assert!(!StreamEvent::Delta("hi".into()).is_terminal());
        assert!(!StreamEvent::Delta(String::new()).is_terminal());
    }
}
