//! Mixer actions reachable from the keyboard

use stemdeck_audio::{ChannelId, MixerCommand, SessionConfig};

/// Step direction for volume and seek keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Down => -1.0,
            Direction::Up => 1.0,
        }
    }
}

/// What a bound key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TogglePlayPause,
    Stop,
    /// Compact/expanded view, handled by the front end
    TogglePresentation,
    ToggleMasterMute,
    /// Master volume by one volume step
    MasterVolume(Direction),
    /// Seek by one seek step
    Seek(Direction),
    /// Solo by 0-based channel index
    ToggleSolo(usize),
    /// Mute by 0-based channel index
    ToggleMute(usize),
}

impl Action {
    /// Mixer command for this action
    ///
    /// `None` for presentation changes and for channel indexes beyond
    /// `channel_count`.
    pub fn to_command(self, config: &SessionConfig, channel_count: usize) -> Option<MixerCommand> {
        let command = match self {
            Action::TogglePlayPause => MixerCommand::TogglePlayPause,
            Action::Stop => MixerCommand::Stop,
            Action::TogglePresentation => return None,
            Action::ToggleMasterMute => MixerCommand::ToggleMasterMute,
            Action::MasterVolume(dir) => {
                MixerCommand::AdjustMasterVolume(dir.sign() * config.volume_step)
            }
            Action::Seek(dir) => MixerCommand::SeekRelative(dir.sign() as f64 * config.seek_step),
            Action::ToggleSolo(index) if index < channel_count => {
                MixerCommand::ToggleSolo(ChannelId::new(index))
            }
            Action::ToggleMute(index) if index < channel_count => {
                MixerCommand::ToggleMute(ChannelId::new(index))
            }
            Action::ToggleSolo(_) | Action::ToggleMute(_) => return None,
        };
        Some(command)
    }
}
