//! Multiline text input widget

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Maximum visible input height before the text scrolls
const MAX_VISIBLE_LINES: usize = 5;

/// Multiline text editor: Enter submits (handled by the caller),
/// Shift+Enter/Alt+Enter inserts a newline.
#[derive(Debug, Default)]
pub struct InputBox {
    /// Current input text, may contain newlines
    content: String,
    /// Cursor position as a character index into `content`
    cursor: usize,
    /// Placeholder shown while empty
    placeholder: String,
    /// Input surface lock: disabled while a turn is in flight
    enabled: bool,
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Lock or unlock the input surface
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Rows needed to show the content (bordered), capped for tall input
    pub fn desired_height(&self) -> u16 {
        let lines = self.content.split('\n').count().clamp(1, MAX_VISIBLE_LINES);
        lines as u16 + 2
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    /// (row, column) of the cursor in character coordinates
    fn cursor_position(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for c in self.content.chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    fn insert(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert(offset, c);
        self.cursor += 1;
    }

    fn insert_str(&mut self, s: &str) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert_str(offset, s);
        self.cursor += s.chars().count();
    }

    fn remove_char_at(&mut self, char_index: usize) {
        let start = self.byte_offset(char_index);
        let end = self.byte_offset(char_index + 1);
        self.content.drain(start..end);
    }

    /// Move the cursor to (row, col), clamping col to the row length
    fn move_to(&mut self, target_row: usize, target_col: usize) {
        let mut index = 0;
        for (row, line) in self.content.split('\n').enumerate() {
            let len = line.chars().count();
            if row == target_row {
                self.cursor = index + target_col.min(len);
                return;
            }
            index += len + 1;
        }
        self.cursor = self.char_count();
    }

    /// Handle an action, returning true when it changed the editor
    pub fn handle_action(&mut self, action: &Action) -> bool {
        if !self.enabled {
            return false;
        }

        match action {
            Action::Char(c) => {
                self.insert(*c);
                true
            }
            Action::NewLine => {
                self.insert('\n');
                true
            }
            Action::Paste(text) => {
                self.insert_str(text);
                true
            }
            Action::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_char_at(self.cursor);
                    true
                } else {
                    false
                }
            }
            Action::Delete => {
                if self.cursor < self.char_count() {
                    self.remove_char_at(self.cursor);
                    true
                } else {
                    false
                }
            }
            Action::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
                true
            }
            Action::Right => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
                true
            }
            Action::Up => {
                let (row, col) = self.cursor_position();
                if row > 0 {
                    self.move_to(row - 1, col);
                }
                true
            }
            Action::Down => {
                let (row, col) = self.cursor_position();
                self.move_to(row + 1, col);
                true
            }
            Action::Home => {
                let (row, _) = self.cursor_position();
                self.move_to(row, 0);
                true
            }
            Action::End => {
                let (row, _) = self.cursor_position();
                self.move_to(row, usize::MAX);
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                while start > 0 && !chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                if start < self.cursor {
                    let from = self.byte_offset(start);
                    let to = self.byte_offset(self.cursor);
                    self.content.drain(from..to);
                    self.cursor = start;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Render into the buffer with a bordered block
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let border_style = if self.enabled {
            theme.border_style()
        } else {
            theme.dim_style()
        };
        let block = Block::default().borders(Borders::ALL).border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.content.is_empty() {
            let hint = if self.enabled {
                self.placeholder.as_str()
            } else {
                "Waiting for reply..."
            };
            Paragraph::new(Line::styled(hint, theme.dim_style())).render(inner, buf);
        } else {
            let lines: Vec<&str> = self.content.split('\n').collect();
            let (cursor_row, _) = self.cursor_position();

            // Keep the cursor's row visible
            let visible = inner.height as usize;
            let top = cursor_row.saturating_sub(visible.saturating_sub(1));

            let text: Vec<Line> = lines
                .iter()
                .skip(top)
                .take(visible)
                .map(|l| Line::styled(l.to_string(), theme.base_style()))
                .collect();
            Paragraph::new(text).render(inner, buf);
        }

        if self.enabled {
            self.render_cursor(inner, buf);
        }
    }

    fn render_cursor(&self, inner: Rect, buf: &mut Buffer) {
        let (row, col) = self.cursor_position();
        // Display column accounts for wide characters before the cursor
        let line = self.content.split('\n').nth(row).unwrap_or("");
        let display_col: usize = line.chars().take(col).map(|c| c.width().unwrap_or(0)).sum();
        let visible = inner.height as usize;
        let top = row.saturating_sub(visible.saturating_sub(1));
        let y = inner.y + (row - top) as u16;
        let x = inner.x + (display_col as u16).min(inner.width.saturating_sub(1));
        if y < inner.y + inner.height {
            buf[(x, y)].set_style(ratatui::style::Style::default().add_modifier(Modifier::REVERSED));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in s.chars() {
            if c == '\n' {
                input.handle_action(&Action::NewLine);
            } else {
                input.handle_action(&Action::Char(c));
            }
        }
        input
    }

    #[test]
    fn test_typing_and_newlines() {
        let input = typed("ab\ncd");
        assert_eq!(input.content(), "ab\ncd");
        assert_eq!(input.desired_height(), 4);
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut input = typed("ab\ncd");
        input.handle_action(&Action::Home);
        input.handle_action(&Action::Backspace);
        assert_eq!(input.content(), "abcd");
    }

    #[test]
    fn test_cursor_vertical_movement_clamps_column() {
        let mut input = typed("long line\nab");
        // Cursor is at the end of "ab" (col 2); moving up keeps col 2
        input.handle_action(&Action::Up);
        input.handle_action(&Action::Char('X'));
        assert_eq!(input.content(), "loXng line\nab");
    }

    #[test]
    fn test_disabled_input_ignores_edits() {
        let mut input = typed("hi");
        input.set_enabled(false);
        assert!(!input.handle_action(&Action::Char('x')));
        assert!(!input.handle_action(&Action::Backspace));
        assert_eq!(input.content(), "hi");
    }

    #[test]
    fn test_delete_word() {
        let mut input = typed("hello world");
        input.handle_action(&Action::DeleteWord);
        assert_eq!(input.content(), "hello ");
        input.handle_action(&Action::DeleteWord);
        assert_eq!(input.content(), "");
    }

    #[test]
    fn test_paste_multibyte() {
        let mut input = typed("a");
        input.handle_action(&Action::Paste("héllo\nwörld".into()));
        assert_eq!(input.content(), "ahéllo\nwörld");
        input.handle_action(&Action::Char('!'));
        assert_eq!(input.content(), "ahéllo\nwörld!");
    }

    #[test]
    fn test_clear_line_resets() {
        let mut input = typed("some text");
        input.handle_action(&Action::ClearLine);
        assert_eq!(input.content(), "");
        assert_eq!(input.desired_height(), 3);
    }

    #[test]
    fn test_desired_height_caps() {
        let input = typed("1\n2\n3\n4\n5\n6\n7");
        assert_eq!(input.desired_height(), MAX_VISIBLE_LINES as u16 + 2);
    }
}
