//! TUI implementation for annex

use tokio::sync::mpsc;

use annex_chat::{ChatMessage, ChatSession, SessionEvent, Status};
use annex_tui::{
    Theme,
    input::Action,
    widgets::{InputBox, MessageList, Spinner, message_list::calculate_message_height},
};
use crossterm::event::{Event, EventStream, MouseEventKind};
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::time::Instant;

/// Messages sent from the UI state to the session driver
#[derive(Debug)]
pub enum UiMessage {
    /// User submitted input
    Submit(String),
    /// User requested quit
    Quit,
    /// User requested clear
    Clear,
}

/// TUI application state
pub struct TuiState {
    /// Transcript snapshots, rebuilt from session events
    messages: Vec<ChatMessage>,
    /// Input box
    input: InputBox,
    /// Current scroll position
    scroll: usize,
    /// Whether a turn is in flight
    is_processing: bool,
    /// Current status message
    status: String,
    /// Theme
    theme: Theme,
    /// Model shown in the title and status bar
    model: String,
    /// Channel to the session driver
    ui_tx: mpsc::Sender<UiMessage>,
    /// Spinner start time for animation
    spinner_start: Instant,
}

impl TuiState {
    pub fn new(model: String, ui_tx: mpsc::Sender<UiMessage>) -> Self {
        let input = InputBox::new().with_placeholder("Type a message...");

        Self {
            messages: vec![],
            input,
            scroll: 0,
            is_processing: false,
            status: "Ready".to_string(),
            theme: Theme::dark(),
            model,
            ui_tx,
            spinner_start: Instant::now(),
        }
    }

    /// Apply one session event to the transcript
    pub fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TurnStarted { user, assistant } => {
                self.messages.push(user);
                self.messages.push(assistant);
                self.set_processing(true);
                self.scroll_to_bottom();
            }
            SessionEvent::MessageUpdate { snapshot } => {
                self.replace_reply(snapshot);
                self.scroll_to_bottom();
            }
            SessionEvent::TurnEnded { snapshot } => {
                let errored = snapshot.status == Status::Error;
                self.replace_reply(snapshot);
                self.set_processing(false);
                self.status = if errored {
                    "Reply failed".to_string()
                } else {
                    "Ready".to_string()
                };
                self.scroll_to_bottom();
            }
        }
    }

    /// Swap the in-flight assistant message for a newer snapshot
    fn replace_reply(&mut self, snapshot: ChatMessage) {
        if let Some(last) = self.messages.last_mut() {
            *last = snapshot;
        } else {
            self.messages.push(snapshot);
        }
    }

    fn set_processing(&mut self, processing: bool) {
        self.is_processing = processing;
        // Input is locked for the whole turn
        self.input.set_enabled(!processing);
        if processing {
            self.spinner_start = Instant::now();
            self.status = "Thinking...".to_string();
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Clamped against content height during render
        self.scroll = usize::MAX;
    }

    /// Handle a keyboard action; returns false when the UI should exit
    pub async fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Submit => {
                let content = self.input.content().to_string();
                if !content.trim().is_empty() && !self.is_processing {
                    self.input.clear();
                    let _ = self.ui_tx.send(UiMessage::Submit(content)).await;
                }
                true
            }
            Action::Quit | Action::Eof => {
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::Interrupt | Action::Escape => {
                // Outside a turn these just quit; during a turn the
                // driver loop aborts instead of reaching here
                let _ = self.ui_tx.send(UiMessage::Quit).await;
                false
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                true
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                true
            }
            Action::Clear => {
                if !self.is_processing {
                    let _ = self.ui_tx.send(UiMessage::Clear).await;
                    self.messages.clear();
                    self.scroll = 0;
                    self.status = "Cleared".to_string();
                }
                true
            }
            _ => {
                self.input.handle_action(&action);
                true
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let input_height = self.input.desired_height();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),                 // Messages
                Constraint::Length(1),              // Status
                Constraint::Length(input_height),   // Input
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input
            .render(chunks[2], frame.buffer_mut(), &self.theme);
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!(" annex │ {} ", self.model);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 {
            return;
        }

        if self.messages.is_empty() {
            self.render_welcome(frame, inner);
            return;
        }

        let content_height = calculate_message_height(&self.messages, inner.width as usize);

        if self.scroll == usize::MAX {
            // Auto-scroll to bottom
            self.scroll = content_height.saturating_sub(inner.height as usize);
        } else {
            self.scroll = self
                .scroll
                .min(content_height.saturating_sub(inner.height as usize));
        }

        let message_list = MessageList::new(&self.messages, &self.theme).scroll(self.scroll);
        frame.render_widget(message_list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_welcome(&self, frame: &mut Frame, inner: Rect) {
        let welcome = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "  ✦ ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    "annex",
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    " - an annex to your brain",
                    Style::default().fg(Color::DarkGray),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("  Model: {}", self.model),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "  Keybindings",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("    Enter       ", Style::default().fg(Color::Cyan)),
                Span::styled("Send message", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Shift+Enter ", Style::default().fg(Color::Cyan)),
                Span::styled("Insert newline", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Ctrl+L      ", Style::default().fg(Color::Cyan)),
                Span::styled("Clear conversation", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Esc         ", Style::default().fg(Color::Cyan)),
                Span::styled("Cancel reply / Quit", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    Ctrl+C      ", Style::default().fg(Color::Cyan)),
                Span::styled("Abort / Quit", Style::default().fg(Color::White)),
            ]),
            Line::from(vec![
                Span::styled("    PgUp/Dn     ", Style::default().fg(Color::Cyan)),
                Span::styled("Scroll history", Style::default().fg(Color::White)),
            ]),
            Line::from(""),
            Line::from(""),
            Line::from(Span::styled(
                "  Type a message to get started...",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(welcome, inner);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if self.is_processing {
            let spinner =
                Spinner::new(&self.status, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
        } else {
            let left_content = format!("{} │ {}", self.model, self.status);
            let right_content = "Ctrl+L: clear │ Ctrl+C: quit";

            let left_width = left_content.chars().count();
            let right_width = right_content.chars().count();
            let available = area.width as usize;

            let line = if left_width + right_width + 2 <= available {
                let spacing = available - left_width - right_width;
                Line::from(vec![
                    Span::styled(&left_content, self.theme.dim_style()),
                    Span::raw(" ".repeat(spacing)),
                    Span::styled(right_content, Style::default().fg(Color::DarkGray)),
                ])
            } else {
                Line::from(Span::styled(&left_content, self.theme.dim_style()))
            };

            frame.render_widget(Paragraph::new(line), area);
        }
    }
}

/// Run the TUI application
pub async fn run_tui(session: &mut ChatSession, model: &str) -> anyhow::Result<()> {
    use crossterm::{
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::{Terminal, backend::CrosstermBackend};
    use std::io;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);
    let mut state = TuiState::new(model.to_string(), ui_tx);

    let mut session_rx = session.subscribe();
    let mut event_stream = EventStream::new();

    // Tick interval for animations (80ms for smooth spinner)
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    // Prompt queued by Submit; sent at the top of the next iteration so
    // the send future can borrow the session mutably
    let mut pending_prompt: Option<String> = None;

    let result = loop {
        if let Some(content) = pending_prompt.take() {
            // Abort handle works without borrowing the session
            let handle = session.handle();

            let mut send_future = std::pin::pin!(session.send(&content));

            // Drive the turn while keeping the UI responsive
            loop {
                terminal.draw(|frame| state.render(frame))?;

                tokio::select! {
                    biased;

                    _ = &mut send_future => {
                        break;
                    }

                    event = session_rx.recv() => {
                        if let Ok(session_event) = event {
                            state.handle_session_event(session_event);
                        }
                    }

                    event = event_stream.next() => {
                        match event {
                            Some(Ok(Event::Key(key))) => {
                                let action = annex_tui::input::key_to_action(key);
                                match action {
                                    Action::Interrupt | Action::Escape => {
                                        handle.abort();
                                        state.status = "Cancelling...".to_string();
                                    }
                                    Action::Quit | Action::Eof => {
                                        handle.abort();
                                        disable_raw_mode()?;
                                        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                        terminal.show_cursor()?;
                                        return Ok(());
                                    }
                                    // Input is locked while a turn runs
                                    _ => {}
                                }
                            }
                            Some(Ok(Event::Mouse(mouse))) => {
                                match mouse.kind {
                                    MouseEventKind::ScrollUp => {
                                        state.scroll = state.scroll.saturating_sub(3);
                                    }
                                    MouseEventKind::ScrollDown => {
                                        state.scroll = state.scroll.saturating_add(3);
                                    }
                                    _ => {}
                                }
                            }
                            Some(Ok(Event::Resize(_, _))) => {}
                            Some(Err(_)) | None => {
                                handle.abort();
                                disable_raw_mode()?;
                                execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                                terminal.show_cursor()?;
                                return Ok(());
                            }
                            _ => {}
                        }
                    }

                    _ = tick_interval.tick() => {}
                }
            }

            // Drain events the turn produced after the future resolved
            while let Ok(session_event) = session_rx.try_recv() {
                state.handle_session_event(session_event);
            }

            terminal.draw(|frame| state.render(frame))?;
            continue;
        }

        terminal.draw(|frame| state.render(frame))?;

        tokio::select! {
            biased;

            event = session_rx.recv() => {
                if let Ok(session_event) = event {
                    state.handle_session_event(session_event);
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Mouse(mouse))) => {
                        match mouse.kind {
                            MouseEventKind::ScrollUp => {
                                state.scroll = state.scroll.saturating_sub(3);
                            }
                            MouseEventKind::ScrollDown => {
                                state.scroll = state.scroll.saturating_add(3);
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(event)) => {
                        // Key and paste events; resize and the rest map to None
                        if let Some(action) = annex_tui::event_to_action(event) {
                            if !state.handle_action(action).await {
                                break Ok(());
                            }
                        }
                    }
                    Some(Err(e)) => {
                        break Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => {
                        break Ok(());
                    }
                }
            }

            _ = tick_interval.tick() => {}

            msg = ui_rx.recv() => {
                match msg {
                    Some(UiMessage::Submit(content)) => {
                        pending_prompt = Some(content);
                    }
                    Some(UiMessage::Clear) => {
                        session.clear();
                    }
                    Some(UiMessage::Quit) | None => {
                        break Ok(());
                    }
                }
            }
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
