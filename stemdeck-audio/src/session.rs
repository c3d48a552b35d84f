//! Mixer session - owns registry, mix state, transport and progress
//!
//! A session is built from at least two loaded channels and lives until
//! `dispose`. It is owned by one thread; other threads reach it through
//! `MixerCommand`s sent over the bounded command channel and drained by
//! `tick`.

use crate::backend::{AudioBackend, BackendEvent, StemSource, SubscriptionId};
use crate::error::{ChannelLoadError, CommandReport, MixerError};
use crate::mixer::{effective_volume, MixState, Recompute};
use crate::progress::{ProgressReporter, ProgressSample};
use crate::registry::{Channel, ChannelId, ChannelRegistry};
use crate::snapshot::{ChannelSnapshot, MixerSnapshot};
use crate::transport::{DriftReport, PlaybackState, Transport, TransportState};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::{Duration, Instant};

/// Session tuning
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Seconds a channel may drift from the reference before resync
    pub drift_tolerance: f64,
    /// How often `tick` runs drift correction
    pub drift_interval: Duration,
    /// Seconds moved by one seek key press
    pub seek_step: f64,
    /// Master volume moved by one volume key press
    pub volume_step: f32,
    /// Queue depth of each progress subscriber
    pub progress_capacity: usize,
    /// Queue depth of the cross-thread command channel
    pub command_capacity: usize,
    /// Queue depth of backend notifications
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            drift_tolerance: 0.05,
            drift_interval: Duration::from_millis(250),
            seek_step: 10.0,
            volume_step: 0.05,
            progress_capacity: 64,
            command_capacity: 1024,
            event_capacity: 1024,
        }
    }
}

/// Commands accepted from other threads
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixerCommand {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    Seek(f64),
    SeekRelative(f64),
    SetMasterVolume(f32),
    AdjustMasterVolume(f32),
    ToggleMasterMute,
    SetChannelVolume(ChannelId, f32),
    ToggleMute(ChannelId),
    ToggleSolo(ChannelId),
    CorrectDrift,
    Dispose,
}

/// Collects channels before a session starts
pub struct SessionBuilder<B: AudioBackend> {
    backend: B,
    registry: ChannelRegistry,
    config: SessionConfig,
}

impl<B: AudioBackend> SessionBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry: ChannelRegistry::new(),
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load a source into the backend and register it as the next channel
    ///
    /// A source the backend cannot decode is not registered; the builder
    /// stays usable.
    pub fn load(
        &mut self,
        source: StemSource,
        label: impl Into<String>,
    ) -> Result<ChannelId, ChannelLoadError> {
        let label = label.into();
        let described = source.describe();
        match self.backend.load(source) {
            Ok(handle) => {
                let id = self.registry.load(handle, label).id();
                tracing::info!(channel = %id, source = %described, "channel loaded");
                Ok(id)
            }
            Err(source) => {
                tracing::warn!(%label, error = %source, "channel failed to load");
                Err(ChannelLoadError::Decode { label, source })
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    pub fn channels(&self) -> &[Channel] {
        self.registry.all()
    }

    /// Freeze the channel set and start the session
    ///
    /// Fails with fewer than two channels, releasing whatever was loaded.
    pub fn start(mut self) -> Result<MixerSession<B>, ChannelLoadError> {
        if let Err(e) = self.registry.ensure_mixable() {
            for channel in self.registry.all() {
                self.backend.release(channel.handle());
            }
            return Err(e);
        }

        let (event_tx, events) = bounded(self.config.event_capacity);
        let mut subscriptions = Vec::with_capacity(self.registry.len());
        for channel in self.registry.all() {
            match self.backend.subscribe(channel.handle(), event_tx.clone()) {
                Ok(id) => subscriptions.push(id),
                Err(e) => {
                    tracing::warn!(channel = %channel.id(), error = %e, "subscription failed")
                }
            }
        }

        let commands = bounded(self.config.command_capacity);
        let mut session = MixerSession {
            progress: ProgressReporter::new(self.registry.len(), self.config.progress_capacity),
            transport: Transport::new(self.config.drift_tolerance),
            backend: self.backend,
            registry: self.registry,
            mix: MixState::default(),
            events,
            subscriptions,
            commands,
            config: self.config,
            last_drift_check: None,
            disposed: false,
        };
        session.apply_gains(Recompute::All);

        tracing::info!(channels = session.registry.len(), "mixer session started");
        Ok(session)
    }
}

/// A running set of synchronized channels
pub struct MixerSession<B: AudioBackend> {
    backend: B,
    registry: ChannelRegistry,
    mix: MixState,
    transport: Transport,
    progress: ProgressReporter,
    events: Receiver<BackendEvent>,
    subscriptions: Vec<SubscriptionId>,
    commands: (Sender<MixerCommand>, Receiver<MixerCommand>),
    config: SessionConfig,
    last_drift_check: Option<Instant>,
    disposed: bool,
}

impl<B: AudioBackend> MixerSession<B> {
    pub fn channels(&self) -> &[Channel] {
        self.registry.all()
    }

    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    pub fn mix_state(&self) -> &MixState {
        &self.mix
    }

    pub fn transport_state(&self) -> &TransportState {
        self.transport.state()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn snapshot(&self) -> MixerSnapshot {
        MixerSnapshot {
            transport: *self.transport.state(),
            master_volume: self.mix.master_volume(),
            master_muted: self.mix.is_master_muted(),
            soloed: self.mix.soloed(),
            channels: self
                .registry
                .all()
                .iter()
                .map(|c| ChannelSnapshot::capture(c, &self.mix))
                .collect(),
            disposed: self.disposed,
        }
    }

    /// Stream of reference-channel progress
    pub fn subscribe_progress(&mut self) -> Receiver<ProgressSample> {
        self.progress.subscribe()
    }

    /// Latest progress of one channel
    pub fn channel_progress(&self, id: ChannelId) -> Option<ProgressSample> {
        self.progress.channel(id)
    }

    /// Sender for commands from other threads, applied on the next `tick`
    pub fn command_sender(&self) -> Sender<MixerCommand> {
        self.commands.0.clone()
    }

    fn ensure_live(&self, op: &'static str) -> Result<(), MixerError> {
        if self.disposed {
            tracing::warn!(op, "command on disposed session ignored");
            return Err(MixerError::Disposed);
        }
        Ok(())
    }

    fn ensure_channel(&self, id: ChannelId) -> Result<(), MixerError> {
        self.registry.get(id).map(|_| ()).map_err(|e| {
            tracing::warn!(channel = %id, "no such channel");
            MixerError::from(e)
        })
    }

    /// Push effective gains to the backend
    fn apply_gains(&mut self, recompute: Recompute) -> CommandReport {
        let mut report = CommandReport::default();
        for channel in self.registry.all() {
            if let Recompute::Channel(id) = recompute {
                if id != channel.id() {
                    continue;
                }
            }
            let gain = effective_volume(channel, &self.mix);
            if let Err(e) = self.backend.set_volume(channel.handle(), gain) {
                report.push(channel.id(), e);
            }
        }
        report
    }

    pub fn set_master_volume(&mut self, volume: f32) -> Result<CommandReport, MixerError> {
        self.ensure_live("set_master_volume")?;
        let recompute = self.mix.set_master_volume(volume);
        Ok(self.apply_gains(recompute))
    }

    pub fn adjust_master_volume(&mut self, delta: f32) -> Result<CommandReport, MixerError> {
        self.ensure_live("adjust_master_volume")?;
        let recompute = self.mix.adjust_master_volume(delta);
        Ok(self.apply_gains(recompute))
    }

    pub fn toggle_master_mute(&mut self) -> Result<CommandReport, MixerError> {
        self.ensure_live("toggle_master_mute")?;
        let recompute = self.mix.toggle_master_mute();
        Ok(self.apply_gains(recompute))
    }

    pub fn set_channel_volume(
        &mut self,
        id: ChannelId,
        volume: f32,
    ) -> Result<CommandReport, MixerError> {
        self.ensure_live("set_channel_volume")?;
        self.ensure_channel(id)?;
        self.registry.get_mut(id)?.set_volume(volume);
        Ok(self.apply_gains(Recompute::Channel(id)))
    }

    /// Flip a channel's mute; solo is left alone
    pub fn toggle_mute(&mut self, id: ChannelId) -> Result<CommandReport, MixerError> {
        self.ensure_live("toggle_mute")?;
        self.ensure_channel(id)?;
        self.registry.get_mut(id)?.toggle_mute();
        Ok(self.apply_gains(Recompute::Channel(id)))
    }

    pub fn toggle_solo(&mut self, id: ChannelId) -> Result<CommandReport, MixerError> {
        self.ensure_live("toggle_solo")?;
        self.ensure_channel(id)?;
        let recompute = self.mix.toggle_solo(id);
        Ok(self.apply_gains(recompute))
    }

    pub fn play(&mut self) -> Result<CommandReport, MixerError> {
        self.ensure_live("play")?;
        Ok(self.transport.play(&mut self.backend, self.registry.all_mut()))
    }

    pub fn pause(&mut self) -> Result<CommandReport, MixerError> {
        self.ensure_live("pause")?;
        Ok(self.transport.pause(&mut self.backend, self.registry.all_mut()))
    }

    pub fn toggle_play_pause(&mut self) -> Result<CommandReport, MixerError> {
        match self.transport.playback() {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    pub fn stop(&mut self) -> Result<CommandReport, MixerError> {
        self.ensure_live("stop")?;
        Ok(self.transport.stop(&mut self.backend, self.registry.all_mut()))
    }

    pub fn seek(&mut self, seconds: f64) -> Result<CommandReport, MixerError> {
        self.ensure_live("seek")?;
        Ok(self
            .transport
            .seek(&mut self.backend, self.registry.all_mut(), seconds))
    }

    pub fn seek_relative(&mut self, delta: f64) -> Result<CommandReport, MixerError> {
        self.ensure_live("seek_relative")?;
        Ok(self
            .transport
            .seek_relative(&mut self.backend, self.registry.all_mut(), delta))
    }

    pub fn correct_drift(&mut self) -> Result<DriftReport, MixerError> {
        self.ensure_live("correct_drift")?;
        Ok(self
            .transport
            .correct_drift(&mut self.backend, self.registry.all_mut()))
    }

    /// Apply one queued command
    pub fn handle_command(&mut self, command: MixerCommand) -> Result<CommandReport, MixerError> {
        match command {
            MixerCommand::Play => self.play(),
            MixerCommand::Pause => self.pause(),
            MixerCommand::TogglePlayPause => self.toggle_play_pause(),
            MixerCommand::Stop => self.stop(),
            MixerCommand::Seek(seconds) => self.seek(seconds),
            MixerCommand::SeekRelative(delta) => self.seek_relative(delta),
            MixerCommand::SetMasterVolume(volume) => self.set_master_volume(volume),
            MixerCommand::AdjustMasterVolume(delta) => self.adjust_master_volume(delta),
            MixerCommand::ToggleMasterMute => self.toggle_master_mute(),
            MixerCommand::SetChannelVolume(id, volume) => self.set_channel_volume(id, volume),
            MixerCommand::ToggleMute(id) => self.toggle_mute(id),
            MixerCommand::ToggleSolo(id) => self.toggle_solo(id),
            MixerCommand::CorrectDrift => self.correct_drift().map(|drift| drift.report),
            MixerCommand::Dispose => {
                self.dispose();
                Ok(CommandReport::default())
            }
        }
    }

    /// Drain backend notifications; returns how many were applied
    pub fn pump_events(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        let pending: Vec<BackendEvent> = self.events.try_iter().collect();
        let count = pending.len();
        for event in pending {
            self.apply_event(event);
        }
        count
    }

    fn apply_event(&mut self, event: BackendEvent) {
        let Some(channel) = self.registry.by_handle_mut(event.handle()) else {
            return;
        };
        let id = channel.id();
        let is_reference = id.index() == 0;

        match event {
            BackendEvent::MetadataLoaded { duration, .. } => {
                channel.set_duration(duration);
                if is_reference {
                    self.transport.set_duration(duration);
                    tracing::info!(duration, "reference duration known");
                }
            }
            BackendEvent::PositionUpdate { position, .. } => {
                channel.set_position(position);
                let sample = ProgressSample::new(channel.position(), channel.duration());
                self.progress.record_channel(id, sample);
                if is_reference {
                    self.transport.observe_position(position);
                    let state = self.transport.state();
                    self.progress
                        .publish(ProgressSample::new(state.position, state.duration));
                }
            }
            BackendEvent::Ended { .. } => {
                if is_reference {
                    tracing::info!("reference channel ended");
                    self.transport.stop(&mut self.backend, self.registry.all_mut());
                } else {
                    channel.set_active(false);
                }
            }
        }
    }

    /// One iteration of the owner loop
    ///
    /// Flushes backend notifications, applies queued commands, then runs
    /// drift correction when its interval has elapsed. Refused queued
    /// commands are returned in the report's `rejected` list.
    pub fn tick(&mut self, now: Instant) -> CommandReport {
        let mut report = CommandReport::default();
        if self.disposed {
            return report;
        }

        // Notifications already emitted predate any queued command
        self.backend.poll();
        self.pump_events();

        let queued: Vec<MixerCommand> = self.commands.1.try_iter().collect();
        for command in queued {
            match self.handle_command(command) {
                Ok(outcome) => report.merge(outcome),
                Err(e) => report.reject(e),
            }
            if self.disposed {
                return report;
            }
        }

        let due = self
            .last_drift_check
            .map_or(true, |last| now.duration_since(last) >= self.config.drift_interval);
        if due {
            self.last_drift_check = Some(now);
            let drift = self
                .transport
                .correct_drift(&mut self.backend, self.registry.all_mut());
            report.merge(drift.report);
        }

        report
    }

    /// Release every backend resource; safe to call repeatedly
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for channel in self.registry.all() {
            if let Err(e) = self.backend.pause(channel.handle()) {
                tracing::debug!(channel = %channel.id(), error = %e, "pause during dispose");
            }
        }
        for id in self.subscriptions.drain(..) {
            self.backend.unsubscribe(id);
        }
        for channel in self.registry.all() {
            self.backend.release(channel.handle());
        }
        self.progress.close();
        self.transport.halt();

        tracing::info!("mixer session disposed");
    }
}

impl<B: AudioBackend> Drop for MixerSession<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceHandle;
    use crate::error::InvalidChannelIndex;
    use crate::mock::{pcm_source, Call, MockBackend};
    use std::sync::Arc;

    const REFERENCE: ChannelId = ChannelId::new(0);

    fn session(count: usize, duration: f64) -> MixerSession<MockBackend> {
        let mut builder = SessionBuilder::new(MockBackend::new());
        for i in 0..count {
            builder.load(pcm_source(duration), format!("stem {}", i)).unwrap();
        }
        let mut session = builder.start().unwrap();
        session.backend.emit(BackendEvent::MetadataLoaded {
            handle: SourceHandle::from_raw(0),
            duration,
        });
        session.pump_events();
        session.backend.clear_calls();
        session
    }

    fn volumes(session: &MixerSession<MockBackend>) -> Vec<f32> {
        session.backend.units.iter().map(|u| u.volume).collect()
    }

    fn h(raw: u32) -> SourceHandle {
        SourceHandle::from_raw(raw)
    }

    fn assert_volumes(session: &MixerSession<MockBackend>, expected: &[f32]) {
        let got = volumes(session);
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < 1e-6, "volumes {:?} != {:?}", got, expected);
        }
    }

    #[test]
    fn test_builder_needs_two_channels() {
        let mut builder = SessionBuilder::new(MockBackend::new());
        builder.load(pcm_source(10.0), "vocals").unwrap();
        assert!(matches!(
            builder.start(),
            Err(ChannelLoadError::TooFewChannels { loaded: 1, required: 2 })
        ));
    }

    #[test]
    fn test_undecodable_source_is_skipped() {
        let mut builder = SessionBuilder::new(MockBackend::new());
        builder.load(pcm_source(10.0), "vocals").unwrap();
        let err = builder
            .load(
                StemSource::Bytes {
                    data: Arc::new(Vec::new()),
                    extension: Some("mp3".into()),
                },
                "broken",
            )
            .unwrap_err();
        assert!(matches!(err, ChannelLoadError::Decode { ref label, .. } if label == "broken"));
        builder.load(pcm_source(10.0), "drums").unwrap();

        assert_eq!(builder.channel_count(), 2);
        let session = builder.start().unwrap();
        let labels: Vec<&str> = session.channels().iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["vocals", "drums"]);
        assert_eq!(session.channels()[1].id(), ChannelId::new(1));
    }

    #[test]
    fn test_start_applies_unity_gains() {
        let mut builder = SessionBuilder::new(MockBackend::new());
        builder.load(pcm_source(10.0), "vocals").unwrap();
        builder.load(pcm_source(10.0), "drums").unwrap();
        let session = builder.start().unwrap();
        assert_eq!(
            session.backend().calls,
            vec![Call::SetVolume(0, 1.0), Call::SetVolume(1, 1.0)]
        );
        assert_eq!(session.backend().subscriber_count(), 2);
    }

    #[test]
    fn test_master_and_channel_volume() {
        let mut session = session(3, 200.0);
        session.set_master_volume(0.8).unwrap();
        session.set_channel_volume(ChannelId::new(2), 0.5).unwrap();
        assert_volumes(&session, &[0.8, 0.8, 0.4]);
    }

    #[test]
    fn test_solo_exclusive_across_session() {
        let mut session = session(3, 200.0);
        session.set_master_volume(0.8).unwrap();
        session.set_channel_volume(ChannelId::new(2), 0.5).unwrap();

        session.toggle_solo(ChannelId::new(0)).unwrap();
        assert_volumes(&session, &[0.8, 0.0, 0.0]);

        session.toggle_solo(ChannelId::new(2)).unwrap();
        assert_volumes(&session, &[0.0, 0.0, 0.4]);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.channels.iter().filter(|c| c.soloed).count(), 1);
        assert!(snapshot.channels[2].soloed);

        session.toggle_solo(ChannelId::new(2)).unwrap();
        assert_volumes(&session, &[0.8, 0.8, 0.4]);
    }

    #[test]
    fn test_mute_recomputes_only_that_channel() {
        let mut session = session(3, 200.0);
        session.toggle_mute(ChannelId::new(1)).unwrap();
        assert_eq!(session.backend().calls, vec![Call::SetVolume(1, 0.0)]);
        assert_volumes(&session, &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_invalid_channel_is_noop() {
        let mut session = session(2, 60.0);
        let err = session.set_channel_volume(ChannelId::new(7), 0.3).unwrap_err();
        assert!(matches!(err, MixerError::InvalidChannel(_)));
        assert!(session.toggle_solo(ChannelId::new(2)).is_err());
        assert!(session.toggle_mute(ChannelId::new(9)).is_err());
        assert!(session.backend().calls.is_empty());
        assert_eq!(session.mix_state().soloed(), None);
    }

    #[test]
    fn test_master_mute_restores() {
        let mut session = session(2, 60.0);
        session.set_master_volume(0.6).unwrap();
        session.toggle_master_mute().unwrap();
        assert_volumes(&session, &[0.0, 0.0]);
        assert!(session.snapshot().master_muted);
        session.toggle_master_mute().unwrap();
        assert_volumes(&session, &[0.6, 0.6]);
    }

    #[test]
    fn test_seek_past_end_while_playing() {
        let mut session = session(3, 200.0);
        session.play().unwrap();
        session.seek(250.0).unwrap();
        for raw in 0..3 {
            assert_eq!(session.backend().unit(h(raw)).position, 200.0);
        }
        assert!(session.transport_state().is_playing());
    }

    #[test]
    fn test_drift_corrected_on_tick() {
        let mut session = session(3, 200.0);
        session.play().unwrap();
        session.backend.unit_mut(h(0)).position = 10.0;
        session.backend.unit_mut(h(1)).position = 10.12;
        session.backend.unit_mut(h(2)).position = 10.03;
        session.backend.clear_calls();

        let now = Instant::now();
        session.tick(now);
        assert_eq!(session.backend().calls, vec![Call::SetPosition(1, 10.0)]);
        assert_eq!(session.backend().unit(h(1)).position, 10.0);
        assert!(session.backend().unit(h(1)).playing);

        // Not due again until the interval passes
        session.backend.unit_mut(h(2)).position = 11.0;
        session.tick(now + Duration::from_millis(10));
        assert_eq!(session.backend().unit(h(2)).position, 11.0);
        session.tick(now + Duration::from_millis(300));
        assert_eq!(session.backend().unit(h(2)).position, 10.0);
    }

    #[test]
    fn test_toggle_play_pause() {
        let mut session = session(2, 60.0);
        session.toggle_play_pause().unwrap();
        assert_eq!(session.transport_state().playback, PlaybackState::Playing);
        session.toggle_play_pause().unwrap();
        assert_eq!(session.transport_state().playback, PlaybackState::Paused);
    }

    #[test]
    fn test_reference_events_drive_progress() {
        let mut session = session(2, 120.0);
        let progress = session.subscribe_progress();

        session.backend.emit(BackendEvent::PositionUpdate {
            handle: h(1),
            position: 45.0,
        });
        session.backend.emit(BackendEvent::PositionUpdate {
            handle: h(0),
            position: 30.0,
        });
        session.pump_events();

        let samples: Vec<ProgressSample> = progress.try_iter().collect();
        assert_eq!(samples, vec![ProgressSample::new(30.0, Some(120.0))]);
        assert_eq!(session.snapshot().progress(), 0.25);
        assert_eq!(session.channels()[1].position(), 45.0);
        assert_eq!(session.transport_state().position, 30.0);
    }

    #[test]
    fn test_unknown_duration_degrades() {
        let mut builder = SessionBuilder::new(MockBackend::new());
        builder.load(pcm_source(10.0), "vocals").unwrap();
        builder.load(pcm_source(10.0), "drums").unwrap();
        let mut session = builder.start().unwrap();

        session.seek(500.0).unwrap();
        assert_eq!(session.transport_state().position, 500.0);
        assert_eq!(session.snapshot().progress(), 0.0);
    }

    #[test]
    fn test_channel_duration_from_own_metadata() {
        let mut session = session(2, 100.0);
        session.backend.emit(BackendEvent::MetadataLoaded {
            handle: h(1),
            duration: 80.0,
        });
        session.pump_events();
        assert_eq!(session.channels()[1].duration(), Some(80.0));
        assert_eq!(session.transport_state().duration, Some(100.0));
    }

    #[test]
    fn test_reference_end_stops_and_rewinds() {
        let mut session = session(2, 60.0);
        session.play().unwrap();
        session.backend.unit_mut(h(0)).position = 60.0;
        session.backend.emit(BackendEvent::Ended { handle: h(0) });
        session.pump_events();

        assert_eq!(session.transport_state().playback, PlaybackState::Stopped);
        assert_eq!(session.backend().unit(h(0)).position, 0.0);
        assert!(!session.backend().unit(h(1)).playing);
    }

    #[test]
    fn test_other_channel_end_marks_inactive() {
        let mut session = session(2, 60.0);
        session.play().unwrap();
        session.backend.emit(BackendEvent::Ended { handle: h(1) });
        session.pump_events();

        assert!(session.transport_state().is_playing());
        assert!(!session.channels()[1].is_active());
    }

    #[test]
    fn test_queued_commands_apply_on_tick() {
        let mut session = session(2, 60.0);
        let tx = session.command_sender();
        tx.send(MixerCommand::ToggleSolo(ChannelId::new(1))).unwrap();
        tx.send(MixerCommand::Play).unwrap();
        tx.send(MixerCommand::ToggleMute(ChannelId::new(5))).unwrap();

        let report = session.tick(Instant::now());

        assert_eq!(session.mix_state().soloed(), Some(ChannelId::new(1)));
        assert!(session.transport_state().is_playing());
        assert_eq!(
            report.rejected(),
            &[MixerError::InvalidChannel(InvalidChannelIndex(ChannelId::new(5)))]
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_queued_seek_applies_after_pending_end() {
        let mut session = session(2, 60.0);
        session.play().unwrap();
        session.backend.unit_mut(h(0)).position = 60.0;
        session.backend.emit(BackendEvent::Ended { handle: h(0) });
        session
            .command_sender()
            .send(MixerCommand::Seek(30.0))
            .unwrap();

        session.tick(Instant::now());

        assert_eq!(session.transport_state().position, 30.0);
        assert_eq!(session.transport_state().playback, PlaybackState::Paused);
        assert_eq!(session.backend().unit(h(0)).position, 30.0);
        assert_eq!(session.backend().unit(h(1)).position, 30.0);
    }

    #[test]
    fn test_commands_queued_behind_dispose_are_dropped() {
        let mut session = session(2, 60.0);
        let tx = session.command_sender();
        tx.send(MixerCommand::Dispose).unwrap();
        tx.send(MixerCommand::Play).unwrap();

        assert!(session.tick(Instant::now()).is_clean());
        assert!(session.is_disposed());
        assert!(!session.backend().unit(h(0)).playing);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut session = session(3, 60.0);
        session.play().unwrap();
        session.backend.clear_calls();

        session.dispose();
        session.dispose();

        let releases = session
            .backend()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Release(_)))
            .count();
        let unsubscribes = session
            .backend()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Unsubscribe(_)))
            .count();
        assert_eq!(releases, 3);
        assert_eq!(unsubscribes, 3);
        assert_eq!(session.backend().subscriber_count(), 0);
        assert!(session.backend().units.iter().all(|u| u.released && !u.playing));
        assert!(session.snapshot().disposed);
    }

    #[test]
    fn test_disposed_session_rejects_commands() {
        let mut session = session(2, 60.0);
        let progress = session.subscribe_progress();
        session.handle_command(MixerCommand::Dispose).unwrap();

        assert!(matches!(session.play(), Err(MixerError::Disposed)));
        assert!(matches!(
            session.toggle_solo(REFERENCE),
            Err(MixerError::Disposed)
        ));
        assert!(progress.recv().is_err());
        assert!(session.tick(Instant::now()).is_clean());
        assert_eq!(session.transport_state().playback, PlaybackState::Stopped);
    }
}
