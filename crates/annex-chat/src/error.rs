//! Error types for annex-chat

use thiserror::Error;

/// A stream event arrived for a turn that is already terminal (or for a
/// stale handle from an earlier turn).
///
/// This signals a programming defect in the event producer, not a
/// user-facing condition: callers log it and stop consuming the stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("protocol violation: event after terminal state (turn {turn})")]
pub struct ProtocolViolation {
    /// Generation id of the offending turn handle
    pub turn: u64,
}
