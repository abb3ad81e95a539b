//! Drives one conversation turn at a time against a transport.

use std::sync::{Arc, atomic::Ordering};

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use annex_ai::StreamEvent;

use crate::events::SessionEvent;
use crate::handle::SessionHandle;
use crate::message::ChatMessage;
use crate::reducer::{Reducer, TurnHandle};
use crate::transport::Transport;

/// A chat session: reducer plus transport plus event broadcast.
///
/// `send` consumes the reply stream on the caller's task, so every
/// conversation mutation is serialized through one place. Transport and
/// API failures are folded into the assistant message, never returned;
/// subscribers render whatever snapshot arrives.
pub struct ChatSession {
    reducer: Reducer,
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<SessionEvent>,
    handle: SessionHandle,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            reducer: Reducer::new(),
            transport,
            event_tx,
            handle: SessionHandle::new(),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// All messages, in conversation order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.reducer.messages()[..]
    }

    /// Whether a turn is in flight (the UI locks its input while true)
    pub fn is_busy(&self) -> bool {
        self.reducer.is_busy()
    }

    /// Get a cloneable handle for aborting from outside
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Drop the conversation history. No-op while a turn is in flight.
    pub fn clear(&mut self) -> bool {
        self.reducer.clear()
    }

    /// Submit one user message and drive the reply to a terminal state.
    ///
    /// Blank input, or a turn already in flight, is a silent no-op. The
    /// call returns once the assistant message is complete, errored, or
    /// cancelled.
    pub async fn send(&mut self, user_text: &str) {
        let Some(turn) = self.reducer.start(user_text) else {
            return;
        };

        // Fresh token per turn so an old abort cannot cancel a new turn
        *self.handle.cancel.lock() = CancellationToken::new();
        self.handle.is_running.store(true, Ordering::Release);

        let messages = self.reducer.messages();
        let _ = self.event_tx.send(SessionEvent::TurnStarted {
            user: messages[messages.len() - 2].clone(),
            assistant: messages[messages.len() - 1].clone(),
        });

        let stream = match self.transport.send(user_text).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                // Rendered in place of the reply, not propagated
                let _ = self.reducer.on_event(&turn, StreamEvent::Error(e.to_string()));
                self.broadcast_terminal(&turn);
                None
            }
        };

        if let Some(stream) = stream {
            self.consume(stream, &turn).await;
        }

        self.handle.is_running.store(false, Ordering::Release);
        self.handle.idle_notify.notify_waiters();
    }

    async fn consume(&mut self, mut stream: annex_ai::ReplyStream, turn: &TurnHandle) {
        let cancel = self.handle.cancel.lock().clone();
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }

                event = stream.next() => {
                    // A producer that ends without a terminal event is
                    // treated as a clean finish
                    let event = event.unwrap_or(StreamEvent::Done);
                    let terminal = event.is_terminal();

                    match self.reducer.on_event(turn, event) {
                        Ok(()) => {
                            if let Some(snapshot) = self.reducer.assistant(turn).cloned() {
                                let event = if terminal {
                                    SessionEvent::TurnEnded { snapshot }
                                } else {
                                    SessionEvent::MessageUpdate { snapshot }
                                };
                                let _ = self.event_tx.send(event);
                            }
                        }
                        Err(violation) => {
                            tracing::error!("stopping stream consumption: {}", violation);
                            break;
                        }
                    }

                    if terminal {
                        break;
                    }
                }
            }
        }

        // Dropping the stream closes the underlying connection
        drop(stream);

        if cancelled && self.reducer.cancel(turn) {
            self.broadcast_terminal(turn);
        }
    }

    fn broadcast_terminal(&self, turn: &TurnHandle) {
        if let Some(snapshot) = self.reducer.assistant(turn).cloned() {
            let _ = self.event_tx.send(SessionEvent::TurnEnded { snapshot });
        }
    }
}
