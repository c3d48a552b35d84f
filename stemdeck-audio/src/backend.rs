//! Playback backend contract
//!
//! The mixer core never decodes or renders audio. It drives one backend that
//! owns every playable unit and reports back through subscribed channels.

use crate::error::BackendError;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::Arc;

/// Opaque handle to a unit owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(u32);

impl SourceHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Identifies one notification subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Decoded audio, interleaved stereo
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Interleaved L/R samples - Arc to avoid copying through channels
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

/// Where a stem's audio comes from
#[derive(Debug, Clone)]
pub enum StemSource {
    /// An audio file on disk
    Path(PathBuf),
    /// Encoded bytes held in memory (e.g. an upload), with an optional
    /// extension hint for format probing
    Bytes {
        data: Arc<Vec<u8>>,
        extension: Option<String>,
    },
    /// Already decoded audio
    Pcm(PcmBuffer),
}

impl StemSource {
    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            StemSource::Path(path) => path.display().to_string(),
            StemSource::Bytes { data, extension } => format!(
                "{} bytes ({})",
                data.len(),
                extension.as_deref().unwrap_or("unknown format")
            ),
            StemSource::Pcm(pcm) => format!("{} frames @ {}Hz", pcm.frames(), pcm.sample_rate),
        }
    }
}

/// Notifications a backend emits for subscribed handles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendEvent {
    /// Duration became known
    MetadataLoaded { handle: SourceHandle, duration: f64 },
    /// Playback position moved
    PositionUpdate { handle: SourceHandle, position: f64 },
    /// Playback reached the end of the media
    Ended { handle: SourceHandle },
}

impl BackendEvent {
    pub fn handle(&self) -> SourceHandle {
        match *self {
            BackendEvent::MetadataLoaded { handle, .. }
            | BackendEvent::PositionUpdate { handle, .. }
            | BackendEvent::Ended { handle } => handle,
        }
    }
}

/// Playback capability consumed by the mixer session
///
/// Every command is asynchronous from the audio path's point of view and
/// must return without blocking on audio output.
pub trait AudioBackend {
    /// Decode and register a source, returning its handle
    fn load(&mut self, source: StemSource) -> Result<SourceHandle, BackendError>;

    fn play(&mut self, handle: SourceHandle) -> Result<(), BackendError>;

    fn pause(&mut self, handle: SourceHandle) -> Result<(), BackendError>;

    fn set_position(&mut self, handle: SourceHandle, seconds: f64) -> Result<(), BackendError>;

    /// Set output gain in 0.0..=1.0
    fn set_volume(&mut self, handle: SourceHandle, gain: f32) -> Result<(), BackendError>;

    /// Current playback position in seconds
    fn position(&self, handle: SourceHandle) -> Result<f64, BackendError>;

    /// Deliver metadata, position and end-of-media notifications for `handle`
    fn subscribe(
        &mut self,
        handle: SourceHandle,
        events: Sender<BackendEvent>,
    ) -> Result<SubscriptionId, BackendError>;

    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Free the unit behind `handle`; the handle is invalid afterwards
    fn release(&mut self, handle: SourceHandle);

    /// Flush pending notifications to subscribers
    fn poll(&mut self) {}
}

/// Turns encoded sources into PCM for backends that render in-process
pub trait StemDecoder: Send {
    fn decode(&self, source: &StemSource) -> Result<PcmBuffer, BackendError>;
}
