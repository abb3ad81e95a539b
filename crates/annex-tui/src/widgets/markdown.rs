//! Markdown rendering for assistant replies

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

/// Convert markdown text to styled ratatui Lines.
///
/// Partial markdown renders too: an unterminated code fence or emphasis
/// span falls through as best-effort styled text, so streaming replies
/// can be re-rendered on every delta.
pub fn render_markdown<'a>(text: &str, theme: &Theme, width: usize) -> Vec<Line<'a>> {
    let mut renderer = Renderer::new(theme, width);
    for event in Parser::new(text) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct Renderer<'t, 'a> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'a>>,
    current: Vec<Span<'a>>,
    /// Stack of inline styles, innermost last
    styles: Vec<Style>,
    in_code_block: bool,
    code_buf: String,
    list_depth: usize,
}

impl<'t, 'a> Renderer<'t, 'a> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![theme.base_style()],
            in_code_block: false,
            code_buf: String::new(),
            list_depth: 0,
        }
    }

    fn style(&self) -> Style {
        *self.styles.last().unwrap_or(&Style::default())
    }

    fn push_style(&mut self, style: Style) {
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn blank_line(&mut self) {
        self.lines.push(Line::from(""));
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_buf.push_str(&text);
                } else {
                    let style = self.style();
                    self.current.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                let style = self.theme.code_style().add_modifier(Modifier::BOLD);
                self.current.push(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak => self.current.push(Span::raw(" ")),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                let rule = "─".repeat(self.width.min(40));
                self.lines
                    .push(Line::styled(rule, self.theme.dim_style()));
                self.blank_line();
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let style = match level {
                    HeadingLevel::H1 => self
                        .theme
                        .accent_style()
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    HeadingLevel::H2 => self.theme.accent_style().add_modifier(Modifier::BOLD),
                    _ => self.theme.accent_style(),
                };
                self.push_style(style);
            }
            Tag::Paragraph => self.flush_line(),
            Tag::CodeBlock(_) => {
                self.flush_line();
                self.in_code_block = true;
                self.code_buf.clear();
            }
            Tag::List(_) => self.list_depth += 1,
            Tag::Item => {
                self.flush_line();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.current
                    .push(Span::styled(format!("{}• ", indent), self.theme.dim_style()));
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.current
                    .push(Span::styled("│ ", self.theme.dim_style()));
                self.push_style(self.theme.dim_style());
            }
            Tag::Emphasis => self.push_style(self.style().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(self.style().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(self.style().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { .. } => {
                self.push_style(Style::default().fg(self.theme.link).add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush_line();
                self.pop_style();
            }
            TagEnd::Paragraph => {
                self.flush_line();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.flush_code_block();
            }
            TagEnd::List(_) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.pop_style();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style();
            }
            _ => {}
        }
    }

    fn flush_code_block(&mut self) {
        let style = self.theme.code_style().add_modifier(Modifier::DIM);
        let max = self.width.saturating_sub(4);
        for code_line in self.code_buf.lines() {
            let display = if code_line.chars().count() > max {
                let truncated: String = code_line.chars().take(max.saturating_sub(1)).collect();
                format!("  {}…", truncated)
            } else {
                format!("  {}", code_line)
            };
            self.lines.push(Line::from(Span::styled(display, style)));
        }
        self.blank_line();
    }

    fn finish(mut self) -> Vec<Line<'a>> {
        // An open fence at end of input still holds buffered code
        if self.in_code_block {
            self.flush_code_block();
        }
        self.flush_line();

        while self.lines.last().is_some_and(|l| {
            l.spans.is_empty() || (l.spans.len() == 1 && l.spans[0].content.is_empty())
        }) {
            self.lines.pop();
        }

        self.lines
    }
}
