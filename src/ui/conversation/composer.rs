use crate::ui::conversation::commands::{
    command_entries, parse_slash_command, CommandEntry, ParsedCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// Smallest number of text rows the input may grow to before it scrolls
pub const MIN_INPUT_ROWS: u16 = 3;

/// Share of the terminal height the input may take before it scrolls
const MAX_INPUT_SHARE: f64 = 0.3;

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Enter on a non-empty draft; the draft is left in place
    Submitted(String),
    Command(ParsedCommand),
    HistoryOlder,
    HistoryNewer,
    /// The draft text changed
    Edited,
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Byte offset, always on a char boundary
    pub cursor_position: usize,
    /// First visible wrapped row
    pub scroll_offset: usize,
}

/// Multi-line query input with a slash-command palette
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    has_focus: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
    measure_requested: bool,
    text_rows: u16,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
            has_focus: false,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
            measure_requested: true,
            text_rows: 1,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.insert_char('\n');
                    return ComposerResult::Edited;
                }
                if self.show_command_palette && self.apply_selected_command() {
                    return ComposerResult::Edited;
                }
                if self.state.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                if let Some(command) = parse_slash_command(&self.state.content) {
                    self.clear();
                    return ComposerResult::Command(command);
                }
                ComposerResult::Submitted(self.state.content.clone())
            }
            KeyCode::Up => {
                if self.show_command_palette {
                    self.move_command_selection(-1);
                    return ComposerResult::None;
                }
                ComposerResult::HistoryOlder
            }
            KeyCode::Down => {
                if self.show_command_palette {
                    self.move_command_selection(1);
                    return ComposerResult::None;
                }
                ComposerResult::HistoryNewer
            }
            KeyCode::Esc => {
                if self.show_command_palette {
                    self.close_command_palette();
                }
                ComposerResult::None
            }
            KeyCode::Tab => {
                if self.show_command_palette && self.apply_selected_command() {
                    return ComposerResult::Edited;
                }
                ComposerResult::None
            }
            KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => ComposerResult::None,
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.sync_command_palette(Some(c));
                ComposerResult::Edited
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    self.sync_command_palette(None);
                    ComposerResult::Edited
                } else {
                    ComposerResult::None
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    self.sync_command_palette(None);
                    ComposerResult::Edited
                } else {
                    ComposerResult::None
                }
            }
            KeyCode::Left => {
                if let Some(c) = self.state.content[..self.state.cursor_position].chars().next_back() {
                    self.state.cursor_position -= c.len_utf8();
                    self.measure_requested = true;
                }
                ComposerResult::None
            }
            KeyCode::Right => {
                if let Some(c) = self.state.content[self.state.cursor_position..].chars().next() {
                    self.state.cursor_position += c.len_utf8();
                    self.measure_requested = true;
                }
                ComposerResult::None
            }
            KeyCode::Home => {
                self.state.cursor_position = 0;
                self.measure_requested = true;
                ComposerResult::None
            }
            KeyCode::End => {
                self.state.cursor_position = self.state.content.len();
                self.measure_requested = true;
                ComposerResult::None
            }
            _ => ComposerResult::None,
        }
    }

    /// Insert pasted text at the cursor
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.state.content.insert_str(self.state.cursor_position, &text);
        self.state.cursor_position += text.len();
        self.measure_requested = true;
    }

    /// Insert a character at the cursor position
    fn insert_char(&mut self, c: char) {
        self.state.content.insert(self.state.cursor_position, c);
        self.state.cursor_position += c.len_utf8();
        self.measure_requested = true;
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        let state = &mut self.state;
        match state.content[..state.cursor_position].chars().next_back() {
            Some(c) => {
                state.cursor_position -= c.len_utf8();
                state.content.remove(state.cursor_position);
                self.measure_requested = true;
                true
            }
            None => false,
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        if self.state.cursor_position < self.state.content.len() {
            self.state.content.remove(self.state.cursor_position);
            self.measure_requested = true;
            true
        } else {
            false
        }
    }

    fn sync_command_palette(&mut self, typed: Option<char>) {
        let is_command = self.state.content.starts_with('/');
        if !self.show_command_palette {
            if self.state.content == "/" {
                self.open_command_palette();
            }
            return;
        }

        if !is_command || typed.is_some_and(char::is_whitespace) {
            self.close_command_palette();
        } else {
            self.refresh_command_palette();
        }
    }

    fn open_command_palette(&mut self) {
        self.show_command_palette = true;
        self.selected_command = Some(0);
        self.refresh_command_palette();
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.state.content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        self.state.content = format!("/{} ", entry.keyword);
        self.state.cursor_position = self.state.content.len();
        self.measure_requested = true;
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Get current content
    pub fn text(&self) -> &str {
        &self.state.content
    }

    /// Replace the draft, leaving the cursor at its end
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.state.content = text.into();
        self.state.cursor_position = self.state.content.len();
        self.close_command_palette();
        self.measure_requested = true;
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.set_text(String::new());
        self.state.scroll_offset = 0;
    }

    pub fn cursor_position(&self) -> usize {
        self.state.cursor_position
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    pub fn request_measure(&mut self) {
        self.measure_requested = true;
    }

    pub fn measure_requested(&self) -> bool {
        self.measure_requested
    }

    /// Fit the text area to its content for `width` columns (borders included)
    /// and a terminal `terminal_rows` tall. Returns the outer height.
    pub fn measure(&mut self, width: u16, terminal_rows: u16) -> u16 {
        let text_width = width.saturating_sub(2).max(1) as usize;
        let rows = self.visual_rows(text_width);
        let max_rows = max_text_rows(terminal_rows);

        self.text_rows = (rows.len() as u16).clamp(1, max_rows);

        let cursor_row = cursor_row(&rows, self.state.cursor_position);
        let visible = self.text_rows as usize;
        if cursor_row < self.state.scroll_offset {
            self.state.scroll_offset = cursor_row;
        } else if cursor_row >= self.state.scroll_offset + visible {
            self.state.scroll_offset = cursor_row + 1 - visible;
        }
        self.state.scroll_offset = self.state.scroll_offset.min(rows.len().saturating_sub(visible));

        self.measure_requested = false;
        self.text_rows + 2
    }

    /// Outer height from the last measure
    pub fn height(&self) -> u16 {
        self.text_rows + 2
    }

    /// Byte ranges of the content wrapped to `width` chars per row
    fn visual_rows(&self, width: usize) -> Vec<(usize, usize)> {
        let mut rows = Vec::new();
        let mut line_start = 0;

        for line in self.state.content.split('\n') {
            let mut row_start = line_start;
            let mut count = 0;
            for (offset, _) in line.char_indices() {
                if count == width {
                    rows.push((row_start, line_start + offset));
                    row_start = line_start + offset;
                    count = 0;
                }
                count += 1;
            }
            rows.push((row_start, line_start + line.len()));
            line_start += line.len() + 1;
        }

        rows
    }
}

fn max_text_rows(terminal_rows: u16) -> u16 {
    let share = (terminal_rows as f64 * MAX_INPUT_SHARE).floor() as u16;
    share.max(MIN_INPUT_ROWS)
}

fn cursor_row(rows: &[(usize, usize)], cursor: usize) -> usize {
    rows.iter().rposition(|(start, _)| *start <= cursor).unwrap_or(0)
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("🏀 Ask about NCAA basketball")
            .style(if self.has_focus {
                Style::default().fg(Color::Rgb(255, 107, 53))
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            if self.has_focus && inner_area.width > 0 {
                buf.set_string(inner_area.x, inner_area.y, "▌", Style::default().fg(Color::White));
            }
        } else {
            let rows = self.visual_rows(inner_area.width.max(1) as usize);
            let cursor = self.state.cursor_position;
            let cursor_at = cursor_row(&rows, cursor);

            for (i, (start, end)) in rows
                .iter()
                .enumerate()
                .skip(self.state.scroll_offset)
                .take(inner_area.height as usize)
            {
                let text = &self.state.content[*start..*end];
                let line = if self.has_focus && i == cursor_at {
                    let split = cursor - start;
                    Line::from(vec![
                        Span::raw(&text[..split]),
                        Span::styled("▌", Style::default().fg(Color::White)),
                        Span::raw(&text[split..]),
                    ])
                } else {
                    Line::from(text)
                };
                let y = inner_area.y + (i - self.state.scroll_offset) as u16;
                buf.set_line(inner_area.x, y, &line, inner_area.width);
            }
        }

        if self.show_command_palette {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: inner_area.x,
                y: area.y.saturating_sub(palette_height),
                width: inner_area.width,
                height: palette_height.min(area.y),
            };

            Clear.render(palette_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in self.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.selected_command == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled("  ", Style::default()),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
