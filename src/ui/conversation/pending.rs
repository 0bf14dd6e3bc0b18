use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// One-line status shown while requests are in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingIndicator {
    pub loading: bool,
    pub elapsed_seconds: u64,
    pub processing_queries: bool,
}

impl PendingIndicator {
    pub fn is_visible(&self) -> bool {
        self.loading || self.processing_queries
    }

    /// Status text without the animated dots
    pub fn label(&self) -> String {
        match (self.loading, self.processing_queries) {
            (true, true) => format!("Querying {}s · Processing queries", self.elapsed_seconds),
            (true, false) => format!("Querying {}s", self.elapsed_seconds),
            (false, true) => "Processing queries".to_string(),
            (false, false) => String::new(),
        }
    }
}

impl Widget for PendingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.is_visible() || area.height == 0 {
            return;
        }

        let dots = match (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            / 300)
            % 4
        {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        };

        let indicator = Line::from(vec![
            Span::styled("🏀 ", Style::default().fg(Color::Rgb(255, 107, 53))),
            Span::styled(self.label(), Style::default().fg(Color::Rgb(255, 107, 53))),
            Span::styled(dots, Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}
