//! Error types for the mixer core

use crate::backend::SourceHandle;
use crate::registry::ChannelId;
use thiserror::Error;

/// Errors reported by a playback backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Unknown source handle {0:?}")]
    UnknownHandle(SourceHandle),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Playback rejected: {0}")]
    Rejected(String),
    #[error("Device error: {0}")]
    Device(String),
}

/// A channel could not be brought into the session
#[derive(Error, Debug)]
pub enum ChannelLoadError {
    #[error("Failed to load '{label}': {source}")]
    Decode {
        label: String,
        #[source]
        source: BackendError,
    },
    #[error("Mixing needs at least {required} channels, only {loaded} loaded")]
    TooFewChannels { loaded: usize, required: usize },
}

/// A per-channel operation referenced a channel the session does not have
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No channel with index {0}")]
pub struct InvalidChannelIndex(pub ChannelId);

/// A backend command that failed for one channel
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Channel {channel}: {source}")]
pub struct ChannelFailure {
    pub channel: ChannelId,
    #[source]
    pub source: BackendError,
}

/// Errors surfaced by session commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixerError {
    #[error(transparent)]
    InvalidChannel(#[from] InvalidChannelIndex),
    #[error("Session has been disposed")]
    Disposed,
}

/// Per-channel outcome of a command fanned out to every channel
///
/// Failures never abort the fan-out, so a report can carry several.
/// Queued commands the session refused as a whole land in `rejected`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandReport {
    failures: Vec<ChannelFailure>,
    rejected: Vec<MixerError>,
}

impl CommandReport {
    pub(crate) fn push(&mut self, channel: ChannelId, source: BackendError) {
        tracing::warn!(%channel, error = %source, "backend command failed");
        self.failures.push(ChannelFailure { channel, source });
    }

    pub(crate) fn reject(&mut self, error: MixerError) {
        tracing::warn!(%error, "queued command refused");
        self.rejected.push(error);
    }

    pub(crate) fn merge(&mut self, other: CommandReport) {
        self.failures.extend(other.failures);
        self.rejected.extend(other.rejected);
    }

    /// True when every channel accepted every command
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rejected.is_empty()
    }

    pub fn failures(&self) -> &[ChannelFailure] {
        &self.failures
    }

    /// Queued commands that were refused without touching any channel
    pub fn rejected(&self) -> &[MixerError] {
        &self.rejected
    }

    /// Whether a specific channel failed
    pub fn failed(&self, channel: ChannelId) -> bool {
        self.failures.iter().any(|f| f.channel == channel)
    }

    /// One line for a status bar, refused commands first
    pub fn summary(&self) -> String {
        self.rejected
            .iter()
            .map(|e| e.to_string())
            .chain(self.failures.iter().map(|f| f.to_string()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
