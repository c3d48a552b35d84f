//! Status bar widget - seek prompt and status messages

use crate::app::MessageType;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Widget for the bottom status line
pub struct StatusBarWidget<'a> {
    prompt: Option<&'a str>,
    message: Option<&'a str>,
    message_type: MessageType,
    expanded: bool,
    theme: &'a Theme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            prompt: None,
            message: None,
            message_type: MessageType::Info,
            expanded: false,
            theme,
        }
    }

    /// Open seek prompt text, shown in place of the message
    pub fn prompt(mut self, buffer: Option<&'a str>) -> Self {
        self.prompt = buffer;
        self
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Length(10), // Mode
            Constraint::Min(20),    // Prompt / message
            Constraint::Length(22), // Hint
        ])
        .split(area);

        let mode = match (self.prompt.is_some(), self.expanded) {
            (true, _) => ("SEEK", Style::from(self.theme.accent)),
            (false, true) => ("EXPAND", self.theme.highlight()),
            (false, false) => ("MIX", self.theme.highlight()),
        };
        let mode_line = Line::from(vec![
            Span::raw("["),
            Span::styled(mode.0, mode.1),
            Span::raw("]"),
        ]);
        Paragraph::new(mode_line).render(chunks[0], buf);

        let content = if let Some(buffer) = self.prompt {
            Line::from(vec![
                Span::styled("seek to ", Style::from(self.theme.accent)),
                Span::styled(buffer, self.theme.normal()),
                Span::styled("█", self.theme.highlight()),
            ])
        } else if let Some(msg) = self.message {
            let msg_style = match self.message_type {
                MessageType::Info => self.theme.dim(),
                MessageType::Success => Style::from(self.theme.accent),
                MessageType::Warning => Style::default().fg(self.theme.warning),
                MessageType::Error => Style::default().fg(self.theme.danger),
            };
            Line::from(Span::styled(msg, msg_style))
        } else {
            Line::from(Span::styled("Ready. Space plays, F expands", self.theme.dim()))
        };
        Paragraph::new(content).render(chunks[1], buf);

        let hint = if self.prompt.is_some() {
            "Enter:seek  Esc:cancel"
        } else {
            "g:seek  q:quit"
        };
        Paragraph::new(Line::from(Span::styled(hint, self.theme.dim()))).render(chunks[2], buf);
    }
}
