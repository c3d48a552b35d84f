//! Mixer core for stemdeck - synchronized multi-stem playback
//!
//! This crate holds everything between key presses and the audio device:
//! - Registry: loaded channels in load order
//! - Mixer: master volume, mute, exclusive solo, effective gain
//! - Transport: play/pause/stop/seek across all channels, drift correction
//! - Progress: reference position stream for the UI
//! - Session: owner of the above, built from two or more channels
//! - Engine: an in-process backend whose renderer feeds an output callback

mod backend;
mod deck;
mod engine;
mod error;
mod mixer;
mod progress;
mod registry;
mod session;
mod snapshot;
mod transport;

#[cfg(test)]
mod mock;

pub use backend::{
    AudioBackend, BackendEvent, PcmBuffer, SourceHandle, StemDecoder, StemSource, SubscriptionId,
};
pub use deck::Deck;
pub use engine::{DeckBackend, DeckRenderer};
pub use error::{
    BackendError, ChannelFailure, ChannelLoadError, CommandReport, InvalidChannelIndex, MixerError,
};
pub use mixer::{effective_volume, MixState, Recompute};
pub use progress::{format_clock, parse_clock, ProgressReporter, ProgressSample};
pub use registry::{display_label, Channel, ChannelId, ChannelRegistry, MIN_CHANNELS};
pub use session::{MixerCommand, MixerSession, SessionBuilder, SessionConfig};
pub use snapshot::{ChannelSnapshot, MixerSnapshot};
pub use transport::{DriftReport, PlaybackState, Transport, TransportState};
