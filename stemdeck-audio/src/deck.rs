//! Deck - one decoded stem and its playhead

use crate::backend::PcmBuffer;
use crate::transport::PlaybackState;
use std::sync::Arc;

/// Per-frame smoothing coefficient for gain changes
const GAIN_SMOOTHING: f32 = 0.995;

/// A single stem voice rendered by `DeckBackend`
pub struct Deck {
    /// Audio samples (interleaved stereo) - Arc to avoid copying through channels
    samples: Arc<Vec<f32>>,
    /// Sample rate of loaded audio
    sample_rate: u32,
    /// Current playback position in samples
    position: usize,
    /// Playback state
    state: PlaybackState,
    /// Target gain set by the mixer
    gain: f32,
    /// Gain actually applied, smoothed toward `gain` to avoid zipper noise
    current_gain: f32,
    /// Set when playback ran off the end, cleared by `take_ended`
    ended: bool,
}

impl Deck {
    pub fn new(pcm: PcmBuffer) -> Self {
        Self {
            samples: pcm.samples,
            sample_rate: pcm.sample_rate,
            position: 0,
            state: PlaybackState::Stopped,
            gain: 1.0,
            current_gain: 1.0,
            ended: false,
        }
    }

    /// Start playback; a deck parked at the end does not restart
    /// Start playback; false when there is nothing left to play
    pub fn play(&mut self) -> bool {
        if !self.samples.is_empty() && self.position + 1 < self.samples.len() {
            self.state = PlaybackState::Playing;
            return true;
        }
        false
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * 2.0)
    }

    /// Position in seconds
    pub fn position_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.position as f64 / (self.sample_rate as f64 * 2.0)
    }

    /// Set playback position in seconds, clamped to the track
    /// Seek to `position_secs`, clamped to the track
    pub fn seek(&mut self, position_secs: f64) {
        let secs = if position_secs.is_nan() {
            0.0
        } else {
            position_secs.clamp(0.0, self.duration())
        };
        let frame = (secs * self.sample_rate as f64).round() as usize;
        self.position = frame.saturating_mul(2).min(self.samples.len() & !1);
        self.ended = false;
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Returns true once after playback reached the end
    pub fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }

    /// Add this deck's next frames into an interleaved stereo buffer
    pub fn process_into(&mut self, output: &mut [f32]) {
        if self.state != PlaybackState::Playing {
            return;
        }

        let sample_count = self.samples.len();
        for frame in output.chunks_exact_mut(2) {
            if self.position + 1 >= sample_count {
                // End of track
                self.state = PlaybackState::Paused;
                self.ended = true;
                break;
            }

            self.current_gain = self.gain + (self.current_gain - self.gain) * GAIN_SMOOTHING;
            frame[0] += self.samples[self.position] * self.current_gain;
            frame[1] += self.samples[self.position + 1] * self.current_gain;
            self.position += 2;
        }
    }
}
