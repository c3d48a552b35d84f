//! Read-only session snapshot for UI consumption

use crate::mixer::{effective_volume, MixState};
use crate::registry::{Channel, ChannelId};
use crate::transport::TransportState;

/// One channel as seen by a UI
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub id: ChannelId,
    pub label: String,
    pub volume: f32,
    pub muted: bool,
    pub soloed: bool,
    /// Gain currently applied by the backend
    pub effective_volume: f32,
    pub position: f64,
    pub duration: Option<f64>,
    /// Own progress (0.0 - 1.0)
    pub progress: f64,
    pub active: bool,
}

impl ChannelSnapshot {
    pub(crate) fn capture(channel: &Channel, mix: &MixState) -> Self {
        Self {
            id: channel.id(),
            label: channel.label().to_string(),
            volume: channel.volume(),
            muted: channel.is_muted(),
            soloed: mix.is_soloed(channel.id()),
            effective_volume: effective_volume(channel, mix),
            position: channel.position(),
            duration: channel.duration(),
            progress: channel.progress(),
            active: channel.is_active(),
        }
    }

    /// Silenced by another channel's solo
    pub fn is_solo_silenced(&self, soloed: Option<ChannelId>) -> bool {
        matches!(soloed, Some(id) if id != self.id)
    }
}

/// Everything a UI needs to draw the mixer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixerSnapshot {
    pub transport: TransportState,
    pub master_volume: f32,
    pub master_muted: bool,
    pub soloed: Option<ChannelId>,
    pub channels: Vec<ChannelSnapshot>,
    pub disposed: bool,
}

impl MixerSnapshot {
    /// Reference progress (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        self.transport.fraction()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
