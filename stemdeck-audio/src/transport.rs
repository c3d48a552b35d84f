//! Transport controller - drives every channel as one logical transport
//!
//! The first channel is the timing authority. Its position and duration
//! are what the transport reports, and the other channels are pulled back
//! to it when they drift.

use crate::backend::AudioBackend;
use crate::error::CommandReport;
use crate::registry::{Channel, ChannelId};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

/// Transport readout, reference channel time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransportState {
    pub playback: PlaybackState,
    /// Seconds, within 0..=duration once duration is known
    pub position: f64,
    /// Reference channel duration, unknown until its metadata arrives
    pub duration: Option<f64>,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    /// Clamp a target to the playable range (lower bound only while the
    /// duration is unknown)
    pub fn clamp(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
        match self.duration {
            Some(duration) => seconds.min(duration),
            None => seconds,
        }
    }

    /// Position as a fraction of duration (0.0 - 1.0)
    pub fn fraction(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.position / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Result of one drift correction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftReport {
    /// Channels re-positioned onto the reference
    pub resynced: Vec<ChannelId>,
    pub report: CommandReport,
}

/// Transport state machine
///
/// Commands fan out to every channel in registration order. A channel the
/// backend rejects is reported and skipped; the rest still receive the
/// command.
#[derive(Debug, Clone)]
pub struct Transport {
    state: TransportState,
    /// Seconds a channel may lag or lead the reference before resync
    drift_tolerance: f64,
}

impl Transport {
    pub fn new(drift_tolerance: f64) -> Self {
        Self {
            state: TransportState::default(),
            drift_tolerance: drift_tolerance.max(0.0),
        }
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn playback(&self) -> PlaybackState {
        self.state.playback
    }

    pub fn drift_tolerance(&self) -> f64 {
        self.drift_tolerance
    }

    pub(crate) fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            self.state.duration = Some(duration);
            self.state.position = self.state.clamp(self.state.position);
        }
    }

    /// Force the stopped state without touching the backend
    pub(crate) fn halt(&mut self) {
        self.state.playback = PlaybackState::Stopped;
    }

    /// Take a position reported by the reference channel
    pub(crate) fn observe_position(&mut self, position: f64) {
        self.state.position = self.state.clamp(position);
    }

    /// Reference position, asking the backend first and falling back to the
    /// last known value
    fn reference_position<B: AudioBackend + ?Sized>(&self, backend: &B, channels: &[Channel]) -> f64 {
        channels
            .first()
            .and_then(|reference| backend.position(reference.handle()).ok())
            .unwrap_or(self.state.position)
    }

    /// Stopped/Paused -> Playing
    ///
    /// Aligns every channel on the reference position before any of them
    /// starts. A channel whose play command fails is left inactive.
    pub fn play<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        channels: &mut [Channel],
    ) -> CommandReport {
        let mut report = CommandReport::default();
        if self.state.is_playing() {
            return report;
        }

        let target = self.state.clamp(self.reference_position(backend, channels));

        for channel in channels.iter_mut() {
            match backend.set_position(channel.handle(), target) {
                Ok(()) => channel.set_position(target),
                Err(e) => report.push(channel.id(), e),
            }
        }

        let mut started = 0;
        for channel in channels.iter_mut() {
            match backend.play(channel.handle()) {
                Ok(()) => {
                    channel.set_active(true);
                    started += 1;
                }
                Err(e) => {
                    channel.set_active(false);
                    report.push(channel.id(), e);
                }
            }
        }

        self.state.position = target;
        if started > 0 {
            self.state.playback = PlaybackState::Playing;
            tracing::info!(position = target, started, "transport playing");
        }
        report
    }

    /// Playing -> Paused; positions are left where the backend stopped
    pub fn pause<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        channels: &mut [Channel],
    ) -> CommandReport {
        let mut report = CommandReport::default();
        if !self.state.is_playing() {
            return report;
        }

        for channel in channels.iter_mut() {
            match backend.pause(channel.handle()) {
                Ok(()) => channel.set_active(false),
                Err(e) => report.push(channel.id(), e),
            }
        }

        let position = self.reference_position(backend, channels);
        self.state.position = self.state.clamp(position);
        self.state.playback = PlaybackState::Paused;
        tracing::info!(position = self.state.position, "transport paused");
        report
    }

    /// Any -> Stopped; pauses every channel, then rewinds every channel
    pub fn stop<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        channels: &mut [Channel],
    ) -> CommandReport {
        let mut report = CommandReport::default();

        for channel in channels.iter_mut() {
            match backend.pause(channel.handle()) {
                Ok(()) => channel.set_active(false),
                Err(e) => report.push(channel.id(), e),
            }
        }
        for channel in channels.iter_mut() {
            match backend.set_position(channel.handle(), 0.0) {
                Ok(()) => channel.set_position(0.0),
                Err(e) => report.push(channel.id(), e),
            }
        }

        self.state.position = 0.0;
        self.state.playback = PlaybackState::Stopped;
        tracing::info!("transport stopped");
        report
    }

    /// Move every channel to `seconds`, clamped; playing state is kept
    ///
    /// A seek away from zero while stopped leaves the transport paused at
    /// the new position.
    pub fn seek<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        channels: &mut [Channel],
        seconds: f64,
    ) -> CommandReport {
        let mut report = CommandReport::default();
        let target = self.state.clamp(seconds);

        for channel in channels.iter_mut() {
            match backend.set_position(channel.handle(), target) {
                Ok(()) => channel.set_position(target),
                Err(e) => report.push(channel.id(), e),
            }
        }

        // Channels that ran out or were rejected rejoin a playing transport
        if self.state.is_playing() {
            for channel in channels.iter_mut().filter(|c| !c.is_active()) {
                match backend.play(channel.handle()) {
                    Ok(()) => channel.set_active(true),
                    Err(e) => report.push(channel.id(), e),
                }
            }
        }

        self.state.position = target;
        if self.state.playback == PlaybackState::Stopped && target > 0.0 {
            self.state.playback = PlaybackState::Paused;
        }
        tracing::debug!(target, "transport seek");
        report
    }

    /// Seek by `delta` seconds from the current reference position
    pub fn seek_relative<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        channels: &mut [Channel],
        delta: f64,
    ) -> CommandReport {
        let current = self.reference_position(backend, channels);
        self.seek(backend, channels, current + delta)
    }

    /// Pull drifting channels back onto the reference position
    ///
    /// Only runs while playing with an active reference. Drifting channels
    /// are re-positioned without being paused or re-played.
    pub fn correct_drift<B: AudioBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        channels: &mut [Channel],
    ) -> DriftReport {
        let mut drift = DriftReport::default();
        if !self.state.is_playing() {
            return drift;
        }

        let Some((reference, others)) = channels.split_first_mut() else {
            return drift;
        };
        if !reference.is_active() {
            return drift;
        }

        let reference_pos = match backend.position(reference.handle()) {
            Ok(position) => position,
            Err(e) => {
                drift.report.push(reference.id(), e);
                return drift;
            }
        };
        reference.set_position(reference_pos);
        self.state.position = self.state.clamp(reference_pos);

        for channel in others.iter_mut().filter(|c| c.is_active()) {
            let position = match backend.position(channel.handle()) {
                Ok(position) => position,
                Err(e) => {
                    drift.report.push(channel.id(), e);
                    continue;
                }
            };
            channel.set_position(position);

            let diff = position - reference_pos;
            if diff.abs() <= self.drift_tolerance {
                continue;
            }

            match backend.set_position(channel.handle(), reference_pos) {
                Ok(()) => {
                    tracing::debug!(channel = %channel.id(), drift_ms = diff * 1000.0, "resynced channel");
                    channel.set_position(reference_pos);
                    drift.resynced.push(channel.id());
                }
                Err(e) => drift.report.push(channel.id(), e),
            }
        }

        drift
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(0.05)
    }
}
