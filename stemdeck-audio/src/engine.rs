//! In-process backend - decks decoded up front, rendered by the audio thread
//!
//! `DeckBackend` lives on the control thread and implements `AudioBackend`.
//! `DeckRenderer` shares the deck list with the output callback. The callback
//! only ever `try_lock`s, so a command holding the lock costs one silent
//! buffer instead of a blocked audio thread.

use crate::backend::{
    AudioBackend, BackendEvent, PcmBuffer, SourceHandle, StemDecoder, StemSource, SubscriptionId,
};
use crate::deck::Deck;
use crate::error::BackendError;
use crate::mixer::soft_clip;
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;

type DeckList = Arc<Mutex<Vec<Option<Deck>>>>;

struct Subscription {
    id: SubscriptionId,
    handle: SourceHandle,
    events: Sender<BackendEvent>,
    /// Metadata has been delivered
    announced: bool,
    last_position: Option<f64>,
}

/// Backend that owns decoded stems and renders them in-process
pub struct DeckBackend<D: StemDecoder> {
    decoder: D,
    decks: DeckList,
    subscriptions: Vec<Subscription>,
    next_subscription: u32,
}

impl<D: StemDecoder> DeckBackend<D> {
    /// `decoder` must produce PCM at the output device's sample rate
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            decks: Arc::new(Mutex::new(Vec::new())),
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Handle for the audio callback
    pub fn renderer(&self) -> DeckRenderer {
        DeckRenderer {
            decks: Arc::clone(&self.decks),
        }
    }

    fn with_deck<T>(
        &self,
        handle: SourceHandle,
        f: impl FnOnce(&mut Deck) -> T,
    ) -> Result<T, BackendError> {
        let mut decks = self.decks.lock();
        decks
            .get_mut(handle.raw() as usize)
            .and_then(Option::as_mut)
            .map(f)
            .ok_or(BackendError::UnknownHandle(handle))
    }
}

impl<D: StemDecoder> AudioBackend for DeckBackend<D> {
    fn load(&mut self, source: StemSource) -> Result<SourceHandle, BackendError> {
        let pcm: PcmBuffer = match source {
            StemSource::Pcm(pcm) => pcm,
            other => self.decoder.decode(&other)?,
        };
        if pcm.is_empty() {
            return Err(BackendError::Decode("no audio frames".into()));
        }

        let mut decks = self.decks.lock();
        decks.push(Some(Deck::new(pcm)));
        Ok(SourceHandle::from_raw(decks.len() as u32 - 1))
    }

    fn play(&mut self, handle: SourceHandle) -> Result<(), BackendError> {
        if self.with_deck(handle, |deck| deck.play())? {
            Ok(())
        } else {
            Err(BackendError::Rejected("at end of media".into()))
        }
    }

    fn pause(&mut self, handle: SourceHandle) -> Result<(), BackendError> {
        self.with_deck(handle, |deck| deck.pause())
    }

    fn set_position(&mut self, handle: SourceHandle, seconds: f64) -> Result<(), BackendError> {
        self.with_deck(handle, |deck| deck.seek(seconds))
    }

    fn set_volume(&mut self, handle: SourceHandle, gain: f32) -> Result<(), BackendError> {
        self.with_deck(handle, |deck| deck.set_gain(gain))
    }

    fn position(&self, handle: SourceHandle) -> Result<f64, BackendError> {
        self.with_deck(handle, |deck| deck.position_secs())
    }

    fn subscribe(
        &mut self,
        handle: SourceHandle,
        events: Sender<BackendEvent>,
    ) -> Result<SubscriptionId, BackendError> {
        self.with_deck(handle, |_| ())?;
        let id = SubscriptionId::from_raw(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push(Subscription {
            id,
            handle,
            events,
            announced: false,
            last_position: None,
        });
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|s| s.id != id);
    }

    fn release(&mut self, handle: SourceHandle) {
        if let Some(slot) = self.decks.lock().get_mut(handle.raw() as usize) {
            *slot = None;
        }
        self.subscriptions.retain(|s| s.handle != handle);
    }

    fn poll(&mut self) {
        let mut decks = self.decks.lock();

        let mut ended = Vec::new();
        for (i, deck) in decks.iter_mut().enumerate() {
            if let Some(deck) = deck {
                if deck.take_ended() {
                    ended.push(SourceHandle::from_raw(i as u32));
                }
            }
        }

        self.subscriptions.retain_mut(|sub| {
            let Some(Some(deck)) = decks.get(sub.handle.raw() as usize) else {
                return true;
            };

            let mut pending = Vec::with_capacity(3);
            if !sub.announced {
                pending.push(BackendEvent::MetadataLoaded {
                    handle: sub.handle,
                    duration: deck.duration(),
                });
            }
            let position = deck.position_secs();
            if sub.last_position != Some(position) {
                pending.push(BackendEvent::PositionUpdate {
                    handle: sub.handle,
                    position,
                });
            }
            if ended.contains(&sub.handle) {
                pending.push(BackendEvent::Ended { handle: sub.handle });
            }

            for event in pending {
                match sub.events.try_send(event) {
                    Ok(()) => match event {
                        BackendEvent::MetadataLoaded { .. } => sub.announced = true,
                        BackendEvent::PositionUpdate { position, .. } => {
                            sub.last_position = Some(position)
                        }
                        BackendEvent::Ended { .. } => {}
                    },
                    Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => return false,
                }
            }
            true
        });
    }
}

/// Audio-thread side of `DeckBackend`
#[derive(Clone)]
pub struct DeckRenderer {
    decks: DeckList,
}

impl DeckRenderer {
    /// Render every playing deck into an interleaved stereo buffer
    pub fn process(&self, output: &mut [f32]) {
        output.fill(0.0);

        // On contention output silence rather than block
        let Some(mut decks) = self.decks.try_lock() else {
            return;
        };
        for deck in decks.iter_mut().flatten() {
            deck.process_into(output);
        }
        drop(decks);

        for sample in output.iter_mut() {
            *sample = soft_clip(*sample);
        }
    }
}
