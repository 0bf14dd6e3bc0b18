//! Conversation history display component

use crate::events::HistoryDirection;
use crate::models::{Chart, Message};
use crate::render::{format_label, TableView};
use crate::ui::conversation::summary::format_time;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::sync::Arc;

/// Conversation history display component
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    /// Lines scrolled up from the bottom
    scroll: usize,
    /// Message whose chart is on screen; `None` follows the newest chart
    chart_focus: Option<usize>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new message to the history
    pub fn add_message(&mut self, message: Message) {
        if message.chart().is_some() {
            self.chart_focus = None;
        }
        self.messages.push(message);
        self.scroll_to_bottom();
    }

    /// Add a user message
    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.add_message(Message::user(text));
    }

    /// Add a bot message without a response payload
    pub fn add_bot_message(&mut self, text: impl Into<String>, time_taken_ms: Option<u64>) {
        let mut message = Message::bot(text);
        message.time_taken_ms = time_taken_ms;
        self.add_message(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Chart of the most recent message that carries one
    pub fn latest_chart(&self) -> Option<&Arc<Chart>> {
        self.messages.iter().rev().find_map(Message::chart)
    }

    /// Index of the message whose chart is on screen
    pub fn shown_chart_index(&self) -> Option<usize> {
        self.chart_focus
            .or_else(|| self.messages.iter().rposition(|message| message.chart().is_some()))
    }

    pub fn shown_chart(&self) -> Option<&Arc<Chart>> {
        self.messages.get(self.shown_chart_index()?)?.chart()
    }

    /// Move the on-screen chart to the previous or next message with one.
    /// Returns false when there is no chart in that direction.
    pub fn focus_chart(&mut self, direction: HistoryDirection) -> bool {
        let Some(current) = self.shown_chart_index() else {
            return false;
        };

        let has_chart = |index: &usize| self.messages[*index].chart().is_some();
        let target = match direction {
            HistoryDirection::Older => (0..current).rev().find(has_chart),
            HistoryDirection::Newer => (current + 1..self.messages.len()).find(has_chart),
        };

        match target {
            Some(index) => {
                self.chart_focus = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Every display line for `width` columns
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let shown = self.shown_chart_index();
        let mut all_lines = Vec::new();
        for (index, message) in self.messages.iter().enumerate() {
            all_lines.extend(render_message(message, width, shown == Some(index)));
            all_lines.push(Line::default());
        }
        all_lines
    }
}

impl Widget for &ConversationHistory {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.lines(inner_area.width);

        // Anchor to the bottom, then back off by the scroll offset
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_scroll = total.saturating_sub(height);
        let start = max_scroll.saturating_sub(self.scroll.min(max_scroll));

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if self.scroll > 0 && max_scroll > 0 && inner_area.width > 2 {
            let marker = Line::from(Span::styled(" ↓ more ", Style::default().fg(Color::Yellow)));
            let y = inner_area.y + inner_area.height.saturating_sub(1);
            buf.set_line(inner_area.right().saturating_sub(8), y, &marker, 8);
        }
    }
}

/// Render a single message into lines
fn render_message(message: &Message, width: u16, chart_shown: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let role_icon = if message.is_user { "👤" } else { "🏀" };
    let mut header = format!("{} {}", role_icon, message.timestamp.format("%H:%M:%S"));
    if let Some(millis) = message.time_taken_ms {
        header.push_str(&format!(" · {}", format_time(millis)));
    }
    lines.push(Line::from(Span::styled(header, Style::default().fg(Color::DarkGray))));

    let content_width = width.saturating_sub(2) as usize;
    let style = content_style(message.is_user);

    let Some(response) = &message.response else {
        lines.extend(indented(&message.text, content_width, style));
        return lines;
    };

    if !message.text.is_empty() {
        lines.extend(indented(&message.text, content_width, Style::default().fg(Color::Gray)));
    }
    lines.extend(indented(&response.message, content_width, style));

    if let Some(table) = &response.table {
        lines.push(Line::default());
        for line in TableView::new(table).lines() {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }
    }

    if let Some(chart) = &response.chart {
        let hint = if chart_shown {
            " (shown · Ctrl+E to export)"
        } else {
            " (Alt+↑/↓ to show)"
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("📈 {} chart", format_label(chart.chart_type())),
                Style::default().fg(Color::Rgb(78, 205, 196)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(hint, Style::default().fg(Color::DarkGray)),
        ]));
    }

    lines
}

fn indented(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    wrap_text(text, width)
        .into_iter()
        .map(|line| Line::from(vec![Span::raw("  "), Span::styled(line, style)]))
        .collect()
}

/// Get content style based on role
fn content_style(is_user: bool) -> Style {
    if is_user {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    }
}

/// Word-wrap each paragraph of `text` to `width` columns
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Response;
    use serde_json::json;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf.get(x, y).symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn response(value: serde_json::Value) -> Response {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn wrap_keeps_paragraphs() {
        assert_eq!(
            wrap_text("one two three\n\nfour", 7),
            vec!["one two", "three", "", "four"]
        );
    }

    #[test]
    fn latest_chart_skips_messages_without_one() {
        let mut history = ConversationHistory::new();
        let with_chart = response(json!({
            "message": "wins",
            "graphData": { "chartType": "bar", "x": ["Duke"], "y": [30] }
        }));
        history.add_message(Message::bot("wins by team").with_response(with_chart));
        history.add_bot_message("Sorry, I encountered an error: boom", Some(12));

        let chart = history.latest_chart().unwrap();
        assert_eq!(chart.chart_type(), "bar");
    }

    #[test]
    fn scrolling_is_clamped_at_bottom() {
        let mut history = ConversationHistory::new();
        history.scroll_up(3);
        history.scroll_down(10);
        assert_eq!(history.scroll(), 0);

        history.scroll_up(2);
        history.add_user_message("new query");
        assert_eq!(history.scroll(), 0);
    }

    #[test]
    fn renders_response_text_table_and_chart_note() {
        let mut history = ConversationHistory::new();
        history.add_user_message("top teams");
        let body = response(json!({
            "message": "Here are the top teams",
            "tableData": { "columns": ["team", "wins"], "rows": [["Gonzaga", 31]] },
            "graphData": { "chartType": "multi_line", "x": [], "y": [] }
        }));
        history.add_message(Message::bot("top teams").with_response(body).with_time_taken(1_500));

        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);
        let text = buffer_text(&buf);

        assert!(text.contains("Here are the top teams"));
        assert!(text.contains("Gonzaga"));
        assert!(text.contains("Multi Line chart (shown"));
        assert!(text.contains("· 1s"));
    }

    fn chart_message(chart_type: &str) -> Message {
        let body = response(json!({
            "message": format!("{chart_type} answer"),
            "graphData": { "chartType": chart_type, "x": [1], "y": [2], "values": [1], "labels": ["a"] }
        }));
        Message::bot(format!("{chart_type} query")).with_response(body)
    }

    #[test]
    fn chart_focus_walks_between_charted_messages() {
        let mut history = ConversationHistory::new();
        history.add_message(chart_message("bar"));
        history.add_bot_message("no chart here", None);
        history.add_message(chart_message("pie"));
        assert_eq!(history.shown_chart().unwrap().chart_type(), "pie");

        assert!(history.focus_chart(HistoryDirection::Older));
        assert_eq!(history.shown_chart_index(), Some(0));
        assert_eq!(history.shown_chart().unwrap().chart_type(), "bar");
        assert!(!history.focus_chart(HistoryDirection::Older));

        // Messages without a chart keep the focus where it is
        history.add_bot_message("📁 Chart exported", None);
        assert_eq!(history.shown_chart_index(), Some(0));

        assert!(history.focus_chart(HistoryDirection::Newer));
        assert_eq!(history.shown_chart().unwrap().chart_type(), "pie");
        assert!(!history.focus_chart(HistoryDirection::Newer));

        // A new chart takes over the screen
        history.focus_chart(HistoryDirection::Older);
        history.add_message(chart_message("scatter"));
        assert_eq!(history.shown_chart().unwrap().chart_type(), "scatter");
    }

    #[test]
    fn focus_without_charts_is_refused() {
        let mut history = ConversationHistory::new();
        history.add_user_message("hello");
        assert!(!history.focus_chart(HistoryDirection::Older));
        assert!(history.shown_chart().is_none());
    }

    #[test]
    fn bot_text_is_shown_above_the_answer() {
        let mut history = ConversationHistory::new();
        history.add_message(chart_message("bar"));
        history.add_message(chart_message("pie"));

        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        (&history).render(area, &mut buf);
        let text = buffer_text(&buf);

        assert!(text.contains("bar query"));
        assert!(text.contains("bar answer"));
        assert!(text.contains("Bar chart (Alt+↑/↓ to show)"));
        assert!(text.contains("Pie chart (shown · Ctrl+E to export)"));
    }
}
