//! Mix state - master volume, exclusive solo and effective channel gain

use crate::registry::{clamp_unit, Channel, ChannelId};

/// Which channels need their gain re-applied after a mix change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    All,
    Channel(ChannelId),
}

/// Session-wide mix parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixState {
    /// Master volume (0.0 - 1.0)
    master_volume: f32,
    /// The single soloed channel, if any
    soloed: Option<ChannelId>,
    /// Master volume saved by the master-mute toggle
    master_mute: Option<f32>,
}

impl Default for MixState {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            soloed: None,
            master_mute: None,
        }
    }
}

impl MixState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn soloed(&self) -> Option<ChannelId> {
        self.soloed
    }

    pub fn is_soloed(&self, id: ChannelId) -> bool {
        self.soloed == Some(id)
    }

    /// True while the master-mute toggle holds a saved volume
    pub fn is_master_muted(&self) -> bool {
        self.master_mute.is_some()
    }

    /// Set master volume, clamped to 0.0..=1.0
    ///
    /// An explicit level ends any master-mute toggle; the saved level is
    /// forgotten.
    pub fn set_master_volume(&mut self, volume: f32) -> Recompute {
        self.master_volume = clamp_unit(volume);
        self.master_mute = None;
        Recompute::All
    }

    /// Move master volume by `delta`, snapping to whole percentage points
    pub fn adjust_master_volume(&mut self, delta: f32) -> Recompute {
        let percent = (self.master_volume * 100.0).round() + (delta * 100.0).round();
        self.set_master_volume(percent / 100.0)
    }

    /// First call saves the master volume and silences; second restores
    pub fn toggle_master_mute(&mut self) -> Recompute {
        match self.master_mute.take() {
            Some(saved) => self.master_volume = saved,
            None => {
                self.master_mute = Some(self.master_volume);
                self.master_volume = 0.0;
            }
        }
        Recompute::All
    }

    /// Solo `id`, or clear the solo if `id` already holds it
    ///
    /// The previous solo is replaced in a single assignment, so two channels
    /// are never soloed at once.
    pub fn toggle_solo(&mut self, id: ChannelId) -> Recompute {
        self.soloed = if self.soloed == Some(id) { None } else { Some(id) };
        Recompute::All
    }
}

/// Gain the backend should apply to `channel` under `mix`
pub fn effective_volume(channel: &Channel, mix: &MixState) -> f32 {
    if channel.is_muted() {
        return 0.0;
    }
    if let Some(soloed) = mix.soloed {
        if soloed != channel.id() {
            return 0.0;
        }
    }
    clamp_unit(mix.master_volume * channel.volume())
}

/// Soft clip threshold
const SOFT_CLIP_THRESHOLD: f32 = 0.75;
/// Soft clip ceiling
const SOFT_CLIP_CEILING: f32 = 0.89;

/// Gentle soft clipper for the summed stem bus
///
/// Transparent below threshold; above it, an exponential knee approaches
/// the ceiling so a full set of stems summed at unity never hard-clips.
#[inline(always)]
pub(crate) fn soft_clip(x: f32) -> f32 {
    let abs_x = x.abs();

    if abs_x <= SOFT_CLIP_THRESHOLD {
        return x;
    }

    let sign = x.signum();
    let knee_width = SOFT_CLIP_CEILING - SOFT_CLIP_THRESHOLD;
    let over = abs_x - SOFT_CLIP_THRESHOLD;
    let ratio = over / knee_width;

    let compressed = SOFT_CLIP_THRESHOLD + knee_width * (1.0 - (-ratio * 3.0).exp());
    sign * compressed.min(SOFT_CLIP_CEILING)
}
