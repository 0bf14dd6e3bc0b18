//! Overlay listing past queries, newest first

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// Map a row of the newest-first list back to its history index
pub fn history_index(len: usize, row: usize) -> Option<usize> {
    (row < len).then(|| len - 1 - row)
}

pub struct HistoryPanel<'a> {
    entries: &'a [String],
    selected_row: usize,
}

impl<'a> HistoryPanel<'a> {
    pub fn new(entries: &'a [String], selected_row: usize) -> Self {
        Self {
            entries,
            selected_row,
        }
    }

    /// Overlay rectangle on the right side of `area`
    pub fn area(area: Rect) -> Rect {
        let width = (area.width / 2).clamp(area.width.min(30), area.width);
        Rect {
            x: area.right().saturating_sub(width),
            y: area.y,
            width,
            height: area.height,
        }
    }
}

impl Widget for HistoryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("🕘 Recent queries (Enter to reuse, Esc to close)")
            .style(Style::default().fg(Color::Rgb(78, 205, 196)));
        let inner = block.inner(area);
        block.render(area, buf);

        let visible = inner.height as usize;
        let first = self.selected_row.saturating_sub(visible.saturating_sub(1));

        for (row, entry) in self.entries.iter().rev().enumerate().skip(first).take(visible) {
            let style = if row == self.selected_row {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let text = entry.replace('\n', " ");
            let line = Line::from(vec![
                Span::styled(format!("{:>3}. ", row + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(text, style),
            ]);
            buf.set_line(inner.x, inner.y + (row - first) as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_to_newest_first() {
        assert_eq!(history_index(3, 0), Some(2));
        assert_eq!(history_index(3, 2), Some(0));
        assert_eq!(history_index(3, 3), None);
        assert_eq!(history_index(0, 0), None);
    }

    #[test]
    fn newest_entry_is_drawn_first() {
        let entries = vec!["oldest".to_string(), "newest".to_string()];
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        HistoryPanel::new(&entries, 0).render(area, &mut buf);

        let first_row: String = (0..40).map(|x| buf.get(x, 1).symbol()).collect();
        assert!(first_row.contains("1. newest"));
    }
}
