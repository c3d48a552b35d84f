//! Application state for the mixer view

use crate::theme::Theme;
use stemdeck_audio::{MixerError, MixerSnapshot};
use stemdeck_input::{Action, Dispatch, SeekPrompt};
use stemdeck_library::StemKind;

/// Message type for colored status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Everything the front end draws, refreshed once per frame
pub struct App {
    /// Latest session snapshot
    pub snapshot: MixerSnapshot,
    /// Stem kind per channel, in channel order
    pub kinds: Vec<StemKind>,
    /// Expanded (fullscreen) presentation
    pub expanded: bool,
    pub prompt: SeekPrompt,
    pub theme: Theme,
    pub message: Option<String>,
    pub message_type: MessageType,
    pub should_quit: bool,
}

impl App {
    pub fn new(kinds: Vec<StemKind>) -> Self {
        Self {
            snapshot: MixerSnapshot::default(),
            kinds,
            expanded: false,
            prompt: SeekPrompt::new(),
            theme: Theme::default(),
            message: None,
            message_type: MessageType::Info,
            should_quit: false,
        }
    }

    pub fn update(&mut self, snapshot: MixerSnapshot) {
        self.snapshot = snapshot;
    }

    /// Kind for the channel at `index`, falling back to its label
    pub fn kind(&self, index: usize) -> StemKind {
        self.kinds.get(index).copied().unwrap_or_else(|| {
            self.snapshot
                .channels
                .get(index)
                .map(|c| StemKind::classify(&c.label))
                .unwrap_or(StemKind::Other)
        })
    }

    pub fn toggle_presentation(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn set_theme(&mut self, name: &str) {
        match Theme::by_name(name) {
            Some(theme) => self.theme = theme,
            None => self.set_error(format!("Unknown theme: {}. Use green/amber/cyber", name)),
        }
    }

    /// Reflect a dispatched key in the status line
    pub fn apply_dispatch(&mut self, outcome: &Dispatch) {
        match outcome {
            Dispatch::Applied { report, .. } if !report.is_clean() => {
                self.set_warning(report.summary());
            }
            Dispatch::Applied { .. } => self.clear_message(),
            Dispatch::Presentation => self.toggle_presentation(),
            Dispatch::OutOfRange(action) => {
                let channel = match action {
                    Action::ToggleSolo(i) | Action::ToggleMute(i) => i + 1,
                    _ => 0,
                };
                self.set_warning(format!(
                    "No channel {} ({} loaded)",
                    channel,
                    self.snapshot.channel_count()
                ));
            }
            Dispatch::Rejected { error: MixerError::Disposed, .. } => {
                self.set_error("Session closed");
            }
            Dispatch::Rejected { error, .. } => self.set_error(error.to_string()),
            Dispatch::Unbound | Dispatch::Suppressed => {}
        }
    }

    pub fn clear_message(&mut self) {
        self.message = None;
        self.message_type = MessageType::Info;
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Info;
    }

    pub fn set_success(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Success;
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Warning;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Error;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
