//! Scrollable transcript of chat messages

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use annex_chat::{ChatMessage, Role, Status};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use textwrap;

/// Streaming cursor appended to a reply that is still arriving
const STREAM_CURSOR: &str = "▌";

/// Widget rendering the conversation transcript
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
        }
    }

    /// Set scroll offset in lines from the top
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    fn render_message(&self, msg: &ChatMessage, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let content_width = width.saturating_sub(2);

        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "▶ You",
                    self.theme.accent_bold(),
                )));
                for wrapped in textwrap::wrap(&msg.text, content_width) {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", wrapped),
                        self.theme.base_style(),
                    )));
                }
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "◀ Grok",
                    self.theme.accent_style().add_modifier(Modifier::BOLD),
                )));
                lines.extend(self.render_reply(msg, content_width));
            }
        }

        // Empty line between messages
        lines.push(Line::from(""));
        lines
    }

    fn render_reply(&self, msg: &ChatMessage, content_width: usize) -> Vec<Line<'static>> {
        match msg.status {
            Status::Pending => {
                vec![Line::from(Span::styled(
                    "  thinking...",
                    self.theme.pending_style(),
                ))]
            }
            Status::Error => {
                let mut lines = Vec::new();
                for (i, wrapped) in textwrap::wrap(&msg.text, content_width).iter().enumerate() {
                    let prefix = if i == 0 { "⚠ " } else { "  " };
                    lines.push(Line::from(Span::styled(
                        format!("{}{}", prefix, wrapped),
                        self.theme.error_style(),
                    )));
                }
                lines
            }
            Status::Streaming | Status::Complete => {
                let mut md_lines = render_markdown(&msg.text, self.theme, content_width);
                if msg.status == Status::Streaming {
                    match md_lines.last_mut() {
                        Some(last) => last
                            .spans
                            .push(Span::styled(STREAM_CURSOR, self.theme.accent_style())),
                        None => md_lines.push(Line::from(Span::styled(
                            STREAM_CURSOR,
                            self.theme.accent_style(),
                        ))),
                    }
                }
                md_lines
                    .into_iter()
                    .map(|line| {
                        let mut spans = vec![Span::raw("  ")];
                        spans.extend(
                            line.spans
                                .into_iter()
                                .map(|s| Span::styled(s.content.into_owned(), s.style)),
                        );
                        Line::from(spans)
                    })
                    .collect()
            }
        }
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let mut all_lines: Vec<Line> = Vec::new();
        for msg in self.messages {
            all_lines.extend(self.render_message(msg, width));
        }

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Total rendered height of the transcript, used for scroll clamping.
/// Must agree with the line counts `MessageList` produces.
pub fn calculate_message_height(messages: &[ChatMessage], width: usize) -> usize {
    let theme = Theme::dark();
    let content_width = width.saturating_sub(2);
    let mut total = 0;

    for msg in messages {
        // Role header
        total += 1;
        total += match (msg.role, msg.status) {
            (Role::User, _) => textwrap::wrap(&msg.text, content_width).len(),
            (Role::Assistant, Status::Pending) => 1,
            (Role::Assistant, Status::Error) => textwrap::wrap(&msg.text, content_width).len(),
            (Role::Assistant, _) => {
                let lines = render_markdown(&msg.text, &theme, content_width).len();
                lines.max(usize::from(msg.status == Status::Streaming))
            }
        };
        // Separator
        total += 1;
    }
    total
}
