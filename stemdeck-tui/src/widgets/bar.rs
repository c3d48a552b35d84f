//! Horizontal bar rendering shared by the transport and channel strips

use crate::theme::Theme;
use ratatui::text::Span;

/// Partial block characters for sub-cell resolution (1/8 steps)
const EIGHTHS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// Whole cells and remaining eighths covered by `fraction` of `width`
pub(crate) fn filled_cells(fraction: f64, width: usize) -> (usize, usize) {
    if !fraction.is_finite() || width == 0 {
        return (0, 0);
    }
    let eighths = (fraction.clamp(0.0, 1.0) * width as f64 * 8.0).round() as usize;
    let full = (eighths / 8).min(width);
    let partial = if full == width { 0 } else { eighths % 8 };
    (full, partial)
}

/// Progress bar: solid for the played part, a rule for what is ahead
pub(crate) fn progress_spans(fraction: f64, width: usize, theme: &Theme) -> Vec<Span<'static>> {
    let (full, partial) = filled_cells(fraction, width);
    let mut played = "█".repeat(full);
    let mut used = full;
    if partial > 0 {
        played.push(EIGHTHS[partial]);
        used += 1;
    }
    vec![
        Span::styled(played, theme.progress_style(true)),
        Span::styled("─".repeat(width - used), theme.progress_style(false)),
    ]
}

/// Volume bar colored by level zone
pub(crate) fn volume_spans(level: f32, width: usize, theme: &Theme) -> Vec<Span<'static>> {
    let (full, _) = filled_cells(level as f64, width);
    (0..width)
        .map(|i| {
            if i < full {
                let zone = (i + 1) as f32 / width as f32;
                Span::styled("■", theme.meter_style(zone))
            } else {
                Span::styled("·", theme.dim())
            }
        })
        .collect()
}
