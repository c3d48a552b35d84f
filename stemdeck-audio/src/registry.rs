//! Channel registry - loaded stems in load order

use crate::backend::SourceHandle;
use crate::error::{ChannelLoadError, InvalidChannelIndex};
use std::fmt;

/// Fewest channels a mixer session accepts
pub const MIN_CHANNELS: usize = 2;

/// Stable channel identifier: the 0-based load index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(usize);

impl ChannelId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One loaded stem
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    label: String,
    handle: SourceHandle,
    /// Channel fader (0.0 - 1.0)
    volume: f32,
    muted: bool,
    /// Known once the backend reports metadata
    duration: Option<f64>,
    /// Last position reported or commanded, in seconds
    position: f64,
    /// False when the backend rejected the last play command
    active: bool,
}

impl Channel {
    fn new(id: ChannelId, label: String, handle: SourceHandle) -> Self {
        Self {
            id,
            label,
            handle,
            volume: 1.0,
            muted: false,
            duration: None,
            position: 0.0,
            active: false,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> SourceHandle {
        self.handle
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Own progress (0.0 - 1.0), 0 while duration is unknown
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.position / d).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_unit(volume);
    }

    pub(crate) fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub(crate) fn set_duration(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            self.duration = Some(duration);
        }
    }

    pub(crate) fn set_position(&mut self, position: f64) {
        self.position = position.max(0.0);
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Clamp a gain to 0.0..=1.0, mapping NaN to silence
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Ordered set of loaded channels
///
/// Channels are appended during session setup only; a started session
/// exposes the registry read-only.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend handle under the next sequential id
    pub fn load(&mut self, handle: SourceHandle, label: impl Into<String>) -> &Channel {
        let id = ChannelId::new(self.channels.len());
        self.channels.push(Channel::new(id, label.into(), handle));
        &self.channels[id.index()]
    }

    /// All channels in load order
    pub fn all(&self) -> &[Channel] {
        &self.channels
    }

    pub(crate) fn all_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, id: ChannelId) -> Result<&Channel, InvalidChannelIndex> {
        self.channels.get(id.index()).ok_or(InvalidChannelIndex(id))
    }

    pub(crate) fn get_mut(&mut self, id: ChannelId) -> Result<&mut Channel, InvalidChannelIndex> {
        self.channels
            .get_mut(id.index())
            .ok_or(InvalidChannelIndex(id))
    }

    /// The timing authority: the first channel loaded
    pub fn reference(&self) -> Option<&Channel> {
        self.channels.first()
    }

    pub fn by_handle(&self, handle: SourceHandle) -> Option<&Channel> {
        self.channels.iter().find(|c| c.handle == handle)
    }

    pub(crate) fn by_handle_mut(&mut self, handle: SourceHandle) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.handle == handle)
    }

    /// Fails unless enough channels are loaded to mix
    pub fn ensure_mixable(&self) -> Result<(), ChannelLoadError> {
        if self.channels.len() < MIN_CHANNELS {
            return Err(ChannelLoadError::TooFewChannels {
                loaded: self.channels.len(),
                required: MIN_CHANNELS,
            });
        }
        Ok(())
    }
}

/// Display label for a stem file stem: underscores become spaces, words are
/// title-cased (`song_vocals` -> `Song Vocals`)
pub fn display_label(file_stem: &str) -> String {
    let mut label = String::with_capacity(file_stem.len());
    let mut prev_alpha = false;

    for c in file_stem.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            label.push(c);
            prev_alpha = false;
        }
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(labels: &[&str]) -> ChannelRegistry {
        let mut registry = ChannelRegistry::new();
        for (i, label) in labels.iter().enumerate() {
            registry.load(SourceHandle::from_raw(100 + i as u32), *label);
        }
        registry
    }

    #[test]
    fn test_ids_follow_load_order() {
        let registry = registry_with(&["vocals", "drums", "bass"]);
        let ids: Vec<usize> = registry.all().iter().map(|c| c.id().index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(registry.all()[1].label(), "drums");
        assert_eq!(registry.reference().unwrap().label(), "vocals");
    }

    #[test]
    fn test_defaults() {
        let registry = registry_with(&["vocals", "drums"]);
        let channel = &registry.all()[0];
        assert_eq!(channel.volume(), 1.0);
        assert!(!channel.is_muted());
        assert!(channel.duration().is_none());
        assert_eq!(channel.progress(), 0.0);
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let registry = registry_with(&["vocals", "drums"]);
        let err = registry.get(ChannelId::new(5)).unwrap_err();
        assert_eq!(err, InvalidChannelIndex(ChannelId::new(5)));
    }

    #[test]
    fn test_needs_two_channels() {
        let registry = registry_with(&["vocals"]);
        assert!(matches!(
            registry.ensure_mixable(),
            Err(ChannelLoadError::TooFewChannels { loaded: 1, required: 2 })
        ));
        assert!(registry_with(&["vocals", "drums"]).ensure_mixable().is_ok());
    }

    #[test]
    fn test_lookup_by_handle() {
        let registry = registry_with(&["vocals", "drums"]);
        let channel = registry.by_handle(SourceHandle::from_raw(101)).unwrap();
        assert_eq!(channel.label(), "drums");
        assert!(registry.by_handle(SourceHandle::from_raw(7)).is_none());
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut registry = registry_with(&["vocals", "drums"]);
        let channel = registry.get_mut(ChannelId::new(0)).unwrap();
        channel.set_volume(1.7);
        assert_eq!(channel.volume(), 1.0);
        channel.set_volume(-0.2);
        assert_eq!(channel.volume(), 0.0);
        channel.set_volume(f32::NAN);
        assert_eq!(channel.volume(), 0.0);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("song_vocals"), "Song Vocals");
        assert_eq!(display_label("DRUMS"), "Drums");
        assert_eq!(display_label("my_song_bass"), "My Song Bass");
        assert_eq!(display_label("01_other"), "01 Other");
    }
}
