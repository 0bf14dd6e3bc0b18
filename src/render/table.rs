use crate::models::{value_text, Table};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Widest a single column may grow before its cells are truncated
const MAX_COLUMN_WIDTH: usize = 24;
const COLUMN_GAP: &str = "  ";

/// Text layout of a result table with per-column widths
pub struct TableView<'a> {
    table: &'a Table,
    widths: Vec<usize>,
}

impl<'a> TableView<'a> {
    pub fn new(table: &'a Table) -> Self {
        let column_count = table
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(table.columns.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; column_count];
        for (i, column) in table.columns.iter().enumerate() {
            widths[i] = widths[i].max(column.chars().count());
        }
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(value_text(cell).chars().count());
            }
        }
        for width in &mut widths {
            *width = (*width).min(MAX_COLUMN_WIDTH);
        }

        Self { table, widths }
    }

    /// Styled lines: header, rule, one line per row. Ragged rows render the cells they have.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let cell_style = Style::default().fg(Color::White);

        let mut lines = Vec::with_capacity(self.table.rows.len() + 2);
        lines.push(Line::from(Span::styled(
            self.format_row(self.table.columns.iter().map(String::as_str)),
            header_style,
        )));
        lines.push(Line::from(Span::styled(
            self.rule(),
            Style::default().fg(Color::DarkGray),
        )));

        for row in &self.table.rows {
            let cells: Vec<String> = row.iter().map(value_text).collect();
            lines.push(Line::from(Span::styled(
                self.format_row(cells.iter().map(String::as_str)),
                cell_style,
            )));
        }

        lines
    }

    /// Unstyled rendering for plain output
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.format_row(self.table.columns.iter().map(String::as_str)));
        out.push('\n');
        out.push_str(&self.rule());
        out.push('\n');
        for row in &self.table.rows {
            let cells: Vec<String> = row.iter().map(value_text).collect();
            out.push_str(&self.format_row(cells.iter().map(String::as_str)));
            out.push('\n');
        }
        out
    }

    fn format_row<'s>(&self, cells: impl Iterator<Item = &'s str>) -> String {
        cells
            .zip(self.widths.iter())
            .map(|(cell, &width)| pad(cell, width))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
            .trim_end()
            .to_string()
    }

    fn rule(&self) -> String {
        self.widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
    }
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    if len > width {
        let mut truncated: String = cell.chars().take(width.saturating_sub(1)).collect();
        truncated.push('…');
        truncated
    } else {
        format!("{cell}{}", " ".repeat(width - len))
    }
}
