//! Keyboard command dispatcher - binding table interpreter

use crate::bindings::{lookup, Key};
use crate::commands::Action;
use stemdeck_audio::{AudioBackend, CommandReport, MixerError, MixerSession};

/// What happened to a key
#[derive(Debug)]
pub enum Dispatch {
    /// The mixer command ran
    Applied { action: Action, report: CommandReport },
    /// Presentation toggle for the front end to apply
    Presentation,
    /// Channel key beyond the loaded channel count
    OutOfRange(Action),
    /// The session refused the command
    Rejected { action: Action, error: MixerError },
    /// Key not in the table
    Unbound,
    /// A text-entry control has focus
    Suppressed,
}

/// Routes keys through the binding table into a mixer session
#[derive(Debug, Default)]
pub struct Dispatcher {
    text_focus: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every key is suppressed
    pub fn set_text_focus(&mut self, focused: bool) {
        self.text_focus = focused;
    }

    pub fn has_text_focus(&self) -> bool {
        self.text_focus
    }

    /// Action bound to `key`, unless suppressed
    pub fn resolve(&self, key: Key) -> Option<Action> {
        if self.text_focus {
            return None;
        }
        lookup(key).map(|binding| binding.action)
    }

    pub fn dispatch<B: AudioBackend>(&self, key: Key, session: &mut MixerSession<B>) -> Dispatch {
        if self.text_focus {
            return Dispatch::Suppressed;
        }
        let Some(action) = self.resolve(key) else {
            return Dispatch::Unbound;
        };
        if action == Action::TogglePresentation {
            return Dispatch::Presentation;
        }

        let Some(command) = action.to_command(session.config(), session.channel_count()) else {
            tracing::debug!(?action, channels = session.channel_count(), "key beyond channel count");
            return Dispatch::OutOfRange(action);
        };
        match session.handle_command(command) {
            Ok(report) => Dispatch::Applied { action, report },
            Err(error) => Dispatch::Rejected { action, error },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Direction;
    use stemdeck_audio::{
        BackendError, ChannelId, DeckBackend, PcmBuffer, PlaybackState, SessionBuilder,
        StemDecoder, StemSource,
    };

    struct PcmOnly;

    impl StemDecoder for PcmOnly {
        fn decode(&self, _: &StemSource) -> Result<PcmBuffer, BackendError> {
            Err(BackendError::Decode("pcm only".into()))
        }
    }

    fn session(count: usize) -> MixerSession<DeckBackend<PcmOnly>> {
        let mut builder = SessionBuilder::new(DeckBackend::new(PcmOnly));
        for i in 0..count {
            // 30 seconds at 100 Hz
            let pcm = PcmBuffer::new(vec![0.0; 6000], 100);
            builder.load(StemSource::Pcm(pcm), format!("stem {}", i)).unwrap();
        }
        builder.start().unwrap()
    }

    #[test]
    fn test_space_toggles_transport() {
        let mut session = session(2);
        let dispatcher = Dispatcher::new();

        let outcome = dispatcher.dispatch(Key::Space, &mut session);
        assert!(matches!(
            outcome,
            Dispatch::Applied { action: Action::TogglePlayPause, .. }
        ));
        assert_eq!(session.transport_state().playback, PlaybackState::Playing);

        dispatcher.dispatch(Key::Space, &mut session);
        assert_eq!(session.transport_state().playback, PlaybackState::Paused);

        dispatcher.dispatch(Key::Char('S'), &mut session);
        assert_eq!(session.transport_state().playback, PlaybackState::Stopped);
    }

    #[test]
    fn test_digit_beyond_channels_is_noop() {
        let mut session = session(2);
        let dispatcher = Dispatcher::new();
        let before = session.snapshot();

        assert!(matches!(
            dispatcher.dispatch(Key::Char('3'), &mut session),
            Dispatch::OutOfRange(Action::ToggleSolo(2))
        ));
        assert!(matches!(
            dispatcher.dispatch(Key::Char('#'), &mut session),
            Dispatch::OutOfRange(Action::ToggleMute(2))
        ));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_solo_and_mute_keys() {
        let mut session = session(3);
        let dispatcher = Dispatcher::new();

        dispatcher.dispatch(Key::Char('2'), &mut session);
        assert_eq!(session.mix_state().soloed(), Some(ChannelId::new(1)));
        dispatcher.dispatch(Key::Char('3'), &mut session);
        assert_eq!(session.mix_state().soloed(), Some(ChannelId::new(2)));

        dispatcher.dispatch(Key::Char('!'), &mut session);
        let snapshot = session.snapshot();
        assert!(snapshot.channels[0].muted);
        assert_eq!(snapshot.channels[0].effective_volume, 0.0);
        assert_eq!(snapshot.channels[2].effective_volume, 1.0);
    }

    #[test]
    fn test_volume_and_master_mute_keys() {
        let mut session = session(2);
        let dispatcher = Dispatcher::new();

        dispatcher.dispatch(Key::Down, &mut session);
        dispatcher.dispatch(Key::Down, &mut session);
        assert!((session.mix_state().master_volume() - 0.9).abs() < 1e-6);

        dispatcher.dispatch(Key::Char('m'), &mut session);
        assert_eq!(session.mix_state().master_volume(), 0.0);
        dispatcher.dispatch(Key::Char('M'), &mut session);
        assert!((session.mix_state().master_volume() - 0.9).abs() < 1e-6);

        dispatcher.dispatch(Key::Up, &mut session);
        assert!((session.mix_state().master_volume() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_arrow_keys_seek() {
        let mut session = session(2);
        let dispatcher = Dispatcher::new();

        let outcome = dispatcher.dispatch(Key::Right, &mut session);
        assert!(matches!(
            outcome,
            Dispatch::Applied { action: Action::Seek(Direction::Up), .. }
        ));
        assert!((session.transport_state().position - 10.0).abs() < 1e-9);

        dispatcher.dispatch(Key::Left, &mut session);
        dispatcher.dispatch(Key::Left, &mut session);
        assert_eq!(session.transport_state().position, 0.0);
    }

    #[test]
    fn test_presentation_left_to_front_end() {
        let mut session = session(2);
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(Key::Char('F'), &mut session),
            Dispatch::Presentation
        ));
    }

    #[test]
    fn test_text_focus_suppresses_everything() {
        let mut session = session(2);
        let mut dispatcher = Dispatcher::new();
        dispatcher.set_text_focus(true);

        for key in [Key::Space, Key::Char('s'), Key::Char('1'), Key::Up] {
            assert!(matches!(dispatcher.dispatch(key, &mut session), Dispatch::Suppressed));
        }
        assert_eq!(session.transport_state().playback, PlaybackState::Stopped);
        assert_eq!(session.mix_state().soloed(), None);

        dispatcher.set_text_focus(false);
        assert_eq!(dispatcher.resolve(Key::Char('1')), Some(Action::ToggleSolo(0)));
    }

    #[test]
    fn test_unbound_key() {
        let mut session = session(2);
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(Key::Char('z'), &mut session),
            Dispatch::Unbound
        ));
    }

    #[test]
    fn test_disposed_session_rejects() {
        let mut session = session(2);
        session.dispose();
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(Key::Space, &mut session),
            Dispatch::Rejected { error: MixerError::Disposed, .. }
        ));
    }
}
