//! Channel strip widget - one stem's label, flags, volume and progress

use super::bar::{progress_spans, volume_spans};
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use stemdeck_audio::{format_clock, ChannelId, ChannelSnapshot};
use stemdeck_library::StemKind;

/// Widget for a single channel, one row in compact mode or a boxed
/// strip in expanded mode
pub struct ChannelStripWidget<'a> {
    channel: &'a ChannelSnapshot,
    kind: StemKind,
    soloed: Option<ChannelId>,
    expanded: bool,
    theme: &'a Theme,
}

impl<'a> ChannelStripWidget<'a> {
    pub fn new(channel: &'a ChannelSnapshot, kind: StemKind, theme: &'a Theme) -> Self {
        Self {
            channel,
            kind,
            soloed: None,
            expanded: false,
            theme,
        }
    }

    /// Session-wide solo, used to dim silenced channels
    pub fn soloed(mut self, soloed: Option<ChannelId>) -> Self {
        self.soloed = soloed;
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Number shown next to the label, matching the solo key
    fn hotkey(&self) -> usize {
        self.channel.id.index() + 1
    }

    fn is_silenced(&self) -> bool {
        self.channel.muted || self.channel.is_solo_silenced(self.soloed)
    }

    fn label_style(&self) -> ratatui::style::Style {
        if self.is_silenced() {
            self.theme.dim()
        } else {
            self.theme.normal()
        }
    }

    fn flag_spans(&self) -> Vec<Span<'a>> {
        let mute = if self.channel.muted {
            Span::styled(" M ", self.theme.mute_style())
        } else {
            Span::styled(" m ", self.theme.dim())
        };
        let solo = if self.channel.soloed {
            Span::styled(" S ", self.theme.solo_style())
        } else {
            Span::styled(" s ", self.theme.dim())
        };
        vec![mute, Span::raw(" "), solo]
    }

    fn volume_line(&self, width: usize) -> Vec<Span<'a>> {
        let mut spans = volume_spans(self.channel.volume, width, self.theme);
        spans.push(Span::styled(
            format!(" {:>3}%", (self.channel.volume * 100.0).round() as u32),
            self.label_style(),
        ));
        spans
    }

    fn clock(&self) -> String {
        let total = self
            .channel
            .duration
            .map(format_clock)
            .unwrap_or_else(|| "--:--".to_string());
        format!("{} / {}", format_clock(self.channel.position), total)
    }

    fn render_compact(&self, area: Rect, buf: &mut Buffer) {
        let width = area.width as usize;
        let label_width = 18.min(width / 3);
        let mut label: String = self.channel.label.chars().take(label_width).collect();
        while label.chars().count() < label_width {
            label.push(' ');
        }

        let mut spans = vec![
            Span::styled(format!("{} ", self.hotkey()), self.theme.title()),
            Span::styled(format!("{} ", self.kind.tag()), self.theme.dim()),
            Span::styled(label, self.label_style()),
            Span::raw(" "),
        ];
        spans.extend(self.flag_spans());
        spans.push(Span::raw(" "));

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let remaining = width.saturating_sub(used + 5);
        let volume_width = (remaining / 3).min(12);
        spans.extend(self.volume_line(volume_width));
        spans.push(Span::raw(" "));
        let progress_width = remaining.saturating_sub(volume_width + 2);
        spans.extend(progress_spans(self.channel.progress, progress_width, self.theme));

        Paragraph::new(Line::from(spans)).render(area, buf);
    }

    fn render_expanded(&self, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} {} ", self.hotkey(), self.channel.label);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.channel.soloed {
                self.theme.border_active()
            } else {
                self.theme.border()
            })
            .title(Span::styled(title, self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 1 || inner.width < 8 {
            return;
        }

        let width = inner.width as usize;
        let mut header = vec![Span::styled(format!("{} ", self.kind.tag()), self.theme.dim())];
        header.extend(self.flag_spans());
        if !self.channel.active {
            header.push(Span::styled("  ended", self.theme.dim()));
        }

        let mut lines = vec![Line::from(header)];
        lines.push(Line::from(self.volume_line(width.saturating_sub(6))));
        lines.push(Line::from(progress_spans(self.channel.progress, width, self.theme)));
        lines.push(Line::from(Span::styled(self.clock(), self.label_style())));

        Paragraph::new(lines).render(inner, buf);
    }
}

impl Widget for ChannelStripWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }
        if self.expanded {
            self.render_expanded(area, buf);
        } else {
            self.render_compact(area, buf);
        }
    }
}
