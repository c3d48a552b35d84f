//! Transport widget - playback state, clock, master progress and volume

use super::bar::{progress_spans, volume_spans};
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use stemdeck_audio::{format_clock, MixerSnapshot, PlaybackState, TransportState};

/// `mm:ss / mm:ss`, with `--:--` while the reference duration is unknown
pub fn clock_readout(transport: &TransportState) -> String {
    let total = transport
        .duration
        .map(format_clock)
        .unwrap_or_else(|| "--:--".to_string());
    format!("{} / {}", format_clock(transport.position), total)
}

/// Widget for the master transport
pub struct TransportWidget<'a> {
    snapshot: &'a MixerSnapshot,
    theme: &'a Theme,
    solo_label: Option<&'a str>,
}

impl<'a> TransportWidget<'a> {
    pub fn new(snapshot: &'a MixerSnapshot, theme: &'a Theme) -> Self {
        let solo_label = snapshot.soloed.and_then(|id| {
            snapshot
                .channels
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.label.as_str())
        });
        Self {
            snapshot,
            theme,
            solo_label,
        }
    }

    fn playback_span(&self) -> Span<'a> {
        let (symbol, text) = match self.snapshot.transport.playback {
            PlaybackState::Playing => ("▶", "PLAY"),
            PlaybackState::Paused => ("⏸", "PAUSE"),
            PlaybackState::Stopped => ("⏹", "STOP"),
        };
        let style = if self.snapshot.transport.is_playing() {
            self.theme.highlight()
        } else {
            self.theme.dim()
        };
        Span::styled(format!(" {} {} ", symbol, text), style)
    }

    fn master_spans(&self, width: usize) -> Vec<Span<'a>> {
        let mut spans = vec![Span::styled("MASTER ", self.theme.dim())];
        if self.snapshot.master_muted {
            spans.push(Span::styled(" MUTED ", self.theme.mute_style()));
            return spans;
        }
        spans.extend(volume_spans(self.snapshot.master_volume, width, self.theme));
        spans.push(Span::styled(
            format!(" {:>3}%", (self.snapshot.master_volume * 100.0).round() as u32),
            self.theme.normal(),
        ));
        spans
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.snapshot.transport.is_playing() {
                self.theme.border_active()
            } else {
                self.theme.border()
            })
            .title(Span::styled(" TRANSPORT ", self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 1 || inner.width < 10 {
            return;
        }

        let mut status = vec![
            self.playback_span(),
            Span::raw(" "),
            Span::styled(clock_readout(&self.snapshot.transport), self.theme.normal()),
        ];
        if let Some(label) = self.solo_label {
            status.push(Span::raw("  "));
            status.push(Span::styled(" SOLO ", self.theme.solo_style()));
            status.push(Span::styled(format!(" {}", label), self.theme.normal()));
        }

        let mut lines = vec![Line::from(status)];
        if inner.height >= 2 {
            lines.push(Line::from(progress_spans(
                self.snapshot.progress(),
                inner.width as usize,
                self.theme,
            )));
        }
        if inner.height >= 3 {
            let meter_width = (inner.width as usize).saturating_sub(12).min(30);
            lines.push(Line::from(self.master_spans(meter_width)));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_readout() {
        let transport = TransportState {
            playback: PlaybackState::Playing,
            position: 75.4,
            duration: Some(245.0),
        };
        assert_eq!(clock_readout(&transport), "01:15 / 04:05");
    }

    #[test]
    fn test_clock_readout_unknown_duration() {
        let transport = TransportState::default();
        assert_eq!(clock_readout(&transport), "00:00 / --:--");
    }

    #[test]
    fn test_render_shows_clock_and_mute() {
        let snapshot = MixerSnapshot {
            transport: TransportState {
                playback: PlaybackState::Paused,
                position: 30.0,
                duration: Some(60.0),
            },
            master_muted: true,
            ..MixerSnapshot::default()
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 50, 5);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(&snapshot, &theme).render(area, &mut buf);

        let rows: Vec<String> = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect();
        assert!(rows[1].contains("00:30 / 01:00"));
        assert!(rows[1].contains("PAUSE"));
        assert!(rows[3].contains("MUTED"));
    }
}
