//! annex-tui: terminal UI components
//!
//! Ratatui/crossterm widgets for the chat client: multiline input box,
//! message list with markdown rendering and streaming cursor, spinner.

pub mod input;
pub mod theme;
pub mod widgets;

pub use input::{Action, event_to_action, key_to_action};
pub use theme::Theme;
