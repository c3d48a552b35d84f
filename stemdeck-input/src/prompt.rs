//! Seek-to-time text entry

use crossterm::event::{KeyCode, KeyEvent};
use stemdeck_audio::parse_clock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Not a time: '{0}' (use mm:ss or seconds)")]
    InvalidTime(String),
}

/// Outcome of a key sent to an open prompt
#[derive(Debug, Clone, PartialEq)]
pub enum PromptInput {
    /// Still typing
    Editing,
    /// Closed without a value
    Cancelled,
    /// Closed with a seek target in seconds
    Submitted(f64),
    /// Enter pressed on text that is not a time; the prompt stays open
    Invalid(PromptError),
}

/// Line editor for a `mm:ss` seek target
///
/// While open it holds text focus and the dispatcher stays silent.
#[derive(Debug, Default)]
pub struct SeekPrompt {
    open: bool,
    buffer: String,
}

impl SeekPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current text (for display)
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn open(&mut self) {
        self.open = true;
        self.buffer.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.buffer.clear();
    }

    /// Handle a key while open
    pub fn handle_key(&mut self, key: KeyEvent) -> PromptInput {
        match key.code {
            KeyCode::Enter => match parse_clock(&self.buffer) {
                Some(seconds) => {
                    self.close();
                    PromptInput::Submitted(seconds)
                }
                None => PromptInput::Invalid(PromptError::InvalidTime(self.buffer.clone())),
            },
            KeyCode::Esc => {
                self.close();
                PromptInput::Cancelled
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                PromptInput::Editing
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == ':' || c == '.' => {
                self.buffer.push(c);
                PromptInput::Editing
            }
            _ => PromptInput::Editing,
        }
    }
}
