//! Key legend widget, generated from the binding table

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use stemdeck_input::legend;

/// Front-end keys that live outside the binding table
const FRONT_END_ROWS: [(&str, &str); 2] = [("G", "Seek to time"), ("Q / Ctrl+C", "Quit")];

/// Widget listing every key binding
pub struct LegendWidget<'a> {
    theme: &'a Theme,
    columns: usize,
}

impl<'a> LegendWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme, columns: 1 }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    /// Legend rows followed by the front-end keys
    pub fn rows() -> Vec<(&'static str, &'static str)> {
        let mut rows = legend();
        rows.extend(FRONT_END_ROWS);
        rows
    }
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" KEYS ", self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 1 {
            return;
        }

        let rows = Self::rows();
        let key_width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        let per_column = rows.len().div_ceil(self.columns);
        let column_width = inner.width as usize / self.columns;

        let lines: Vec<Line> = (0..per_column)
            .map(|r| {
                let mut spans = Vec::new();
                for c in 0..self.columns {
                    let Some((keys, description)) = rows.get(c * per_column + r) else {
                        continue;
                    };
                    let text_width = column_width.saturating_sub(key_width + 2);
                    let text: String = description.chars().take(text_width).collect();
                    spans.push(Span::styled(format!("{:<key_width$}  ", keys), self.theme.title()));
                    spans.push(Span::styled(format!("{:<text_width$}", text), self.theme.dim()));
                }
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
