//! Recording backend for unit tests

use crate::backend::{AudioBackend, BackendEvent, SourceHandle, StemSource, SubscriptionId};
use crate::error::BackendError;
use crossbeam_channel::Sender;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Call {
    Play(u32),
    Pause(u32),
    SetPosition(u32, f64),
    SetVolume(u32, f32),
    Release(u32),
    Unsubscribe(u32),
}

#[derive(Debug, Clone)]
pub(crate) struct MockUnit {
    pub position: f64,
    pub volume: f32,
    pub playing: bool,
    pub released: bool,
    pub duration: f64,
}

#[derive(Default)]
pub(crate) struct MockBackend {
    pub units: Vec<MockUnit>,
    pub calls: Vec<Call>,
    /// Handles whose play command is rejected
    pub fail_play: HashSet<u32>,
    subscribers: Vec<(SubscriptionId, SourceHandle, Sender<BackendEvent>)>,
    next_subscription: u32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `count` PCM units of `duration` seconds each
    pub fn with_units(count: usize, duration: f64) -> (Self, Vec<SourceHandle>) {
        let mut backend = Self::new();
        let handles = (0..count)
            .map(|_| backend.load(pcm_source(duration)).unwrap())
            .collect();
        (backend, handles)
    }

    pub fn unit(&self, handle: SourceHandle) -> &MockUnit {
        &self.units[handle.raw() as usize]
    }

    pub fn unit_mut(&mut self, handle: SourceHandle) -> &mut MockUnit {
        &mut self.units[handle.raw() as usize]
    }

    /// Send `event` to every subscriber of its handle
    pub fn emit(&self, event: BackendEvent) {
        for (_, handle, tx) in &self.subscribers {
            if *handle == event.handle() {
                let _ = tx.send(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn live(&mut self, handle: SourceHandle) -> Result<&mut MockUnit, BackendError> {
        match self.units.get_mut(handle.raw() as usize) {
            Some(unit) if !unit.released => Ok(unit),
            _ => Err(BackendError::UnknownHandle(handle)),
        }
    }
}

/// In-memory source of `duration` seconds of silence at 10 Hz
pub(crate) fn pcm_source(duration: f64) -> StemSource {
    let frames = (duration * 10.0).round() as usize;
    StemSource::Pcm(crate::backend::PcmBuffer::new(vec![0.0; frames * 2], 10))
}

impl AudioBackend for MockBackend {
    fn load(&mut self, source: StemSource) -> Result<SourceHandle, BackendError> {
        let duration = match source {
            StemSource::Pcm(pcm) => pcm.duration_secs(),
            StemSource::Bytes { data, .. } if !data.is_empty() => data.len() as f64,
            StemSource::Bytes { .. } => return Err(BackendError::Decode("empty input".into())),
            StemSource::Path(path) => {
                return Err(BackendError::Decode(format!("cannot open {}", path.display())))
            }
        };
        self.units.push(MockUnit {
            position: 0.0,
            volume: 1.0,
            playing: false,
            released: false,
            duration,
        });
        Ok(SourceHandle::from_raw(self.units.len() as u32 - 1))
    }

    fn play(&mut self, handle: SourceHandle) -> Result<(), BackendError> {
        self.calls.push(Call::Play(handle.raw()));
        if self.fail_play.contains(&handle.raw()) {
            return Err(BackendError::Rejected("autoplay blocked".into()));
        }
        self.live(handle)?.playing = true;
        Ok(())
    }

    fn pause(&mut self, handle: SourceHandle) -> Result<(), BackendError> {
        self.calls.push(Call::Pause(handle.raw()));
        self.live(handle)?.playing = false;
        Ok(())
    }

    fn set_position(&mut self, handle: SourceHandle, seconds: f64) -> Result<(), BackendError> {
        self.calls.push(Call::SetPosition(handle.raw(), seconds));
        self.live(handle)?.position = seconds;
        Ok(())
    }

    fn set_volume(&mut self, handle: SourceHandle, gain: f32) -> Result<(), BackendError> {
        self.calls.push(Call::SetVolume(handle.raw(), gain));
        self.live(handle)?.volume = gain;
        Ok(())
    }

    fn position(&self, handle: SourceHandle) -> Result<f64, BackendError> {
        match self.units.get(handle.raw() as usize) {
            Some(unit) if !unit.released => Ok(unit.position),
            _ => Err(BackendError::UnknownHandle(handle)),
        }
    }

    fn subscribe(
        &mut self,
        handle: SourceHandle,
        events: Sender<BackendEvent>,
    ) -> Result<SubscriptionId, BackendError> {
        self.live(handle)?;
        let id = SubscriptionId::from_raw(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, handle, events));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.calls.push(Call::Unsubscribe(id.raw()));
        self.subscribers.retain(|(sub, _, _)| *sub != id);
    }

    fn release(&mut self, handle: SourceHandle) {
        self.calls.push(Call::Release(handle.raw()));
        if let Some(unit) = self.units.get_mut(handle.raw() as usize) {
            unit.released = true;
            unit.playing = false;
        }
    }
}
