//! CRT-style themes for the mixer view

use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    /// Primary foreground color (text, borders)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (active elements)
    pub highlight: Color,
    /// Accent color (volume bars, progress)
    pub accent: Color,
    pub warning: Color,
    pub danger: Color,
    /// Soloed channel flag
    pub solo: Color,
    /// Muted channel flag
    pub mute: Color,
}

impl Theme {
    /// Look up a theme by name or alias
    pub fn by_name(name: &str) -> Option<Theme> {
        match name.trim().to_lowercase().as_str() {
            "green" | "phosphor" | "phosphor-green" => Some(CRT_GREEN),
            "amber" | "orange" => Some(CRT_AMBER),
            "cyber" | "cyberpunk" | "neon" => Some(CYBERPUNK),
            _ => None,
        }
    }

    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn border_active(&self) -> Style {
        Style::default().fg(self.highlight)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for volume bars based on level (0.0 - 1.0)
    pub fn meter_style(&self, level: f32) -> Style {
        let color = if level > 0.9 {
            self.danger
        } else if level > 0.75 {
            self.warning
        } else {
            self.accent
        };
        Style::default().fg(color)
    }

    /// Style for a progress cell, played or still ahead
    pub fn progress_style(&self, is_played: bool) -> Style {
        if is_played {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.fg_dim)
        }
    }

    pub fn solo_style(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.solo)
            .add_modifier(Modifier::BOLD)
    }

    pub fn mute_style(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.mute)
            .add_modifier(Modifier::BOLD)
    }
}

/// Classic phosphor green CRT theme
pub const CRT_GREEN: Theme = Theme {
    name: "phosphor-green",
    fg: Color::Rgb(51, 255, 51),
    fg_dim: Color::Rgb(25, 128, 25),
    bg: Color::Rgb(0, 10, 0),
    highlight: Color::Rgb(180, 255, 180),
    accent: Color::Rgb(100, 255, 100),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
    solo: Color::Rgb(150, 255, 100),
    mute: Color::Rgb(255, 100, 100),
};

/// Amber CRT theme (1980s monochrome)
pub const CRT_AMBER: Theme = Theme {
    name: "amber",
    fg: Color::Rgb(255, 176, 0),
    fg_dim: Color::Rgb(128, 88, 0),
    bg: Color::Rgb(10, 5, 0),
    highlight: Color::Rgb(255, 220, 128),
    accent: Color::Rgb(255, 200, 64),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
    solo: Color::Rgb(255, 220, 100),
    mute: Color::Rgb(255, 100, 100),
};

/// Cyberpunk neon theme
pub const CYBERPUNK: Theme = Theme {
    name: "cyberpunk",
    fg: Color::Rgb(0, 255, 255),
    fg_dim: Color::Rgb(0, 128, 128),
    bg: Color::Rgb(5, 0, 10),
    highlight: Color::Rgb(255, 0, 255),
    accent: Color::Rgb(0, 255, 128),
    warning: Color::Rgb(255, 255, 0),
    danger: Color::Rgb(255, 50, 50),
    solo: Color::Rgb(255, 100, 255),
    mute: Color::Rgb(255, 50, 50),
};

impl Default for Theme {
    fn default() -> Self {
        CRT_GREEN
    }
}
