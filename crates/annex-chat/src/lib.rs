//! annex-chat: conversation state and the streaming-reply reducer
//!
//! The reducer folds an ordered `StreamEvent` sequence from a completion
//! transport into `ChatMessage` state transitions; `ChatSession` drives one
//! turn at a time and broadcasts immutable snapshots for rendering.

pub mod error;
pub mod events;
pub mod handle;
pub mod message;
pub mod reducer;
pub mod session;
pub mod transport;

pub use error::ProtocolViolation;
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use message::{ChatMessage, Role, Status};
pub use reducer::{Reducer, TurnHandle};
pub use session::ChatSession;
pub use transport::{BufferedTransport, ChatOptions, StreamingTransport, Transport};
