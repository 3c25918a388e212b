//! Fan-out of playback state to observers.
//!
//! Observers are plain channel senders; whichever ones hang up are dropped on
//! the next broadcast. The latest full state is also mirrored into a
//! `SharedState` snapshot for readers that poll instead of subscribing.

use std::sync::mpsc::Sender;

use super::types::{PlaybackState, PlayerEvent, SharedState};

pub struct Publisher {
    observers: Vec<Sender<PlayerEvent>>,
    shared: SharedState,
    /// What observers have been told so far.
    last: PlaybackState,
}

fn song_id(state: &PlaybackState) -> Option<u64> {
    state.current.as_ref().map(|t| t.id)
}

fn progress(state: &PlaybackState) -> PlayerEvent {
    PlayerEvent::Progress {
        position_ms: state.position_ms,
        duration_ms: state.duration_ms,
    }
}

impl Publisher {
    pub fn new(shared: SharedState, initial: &PlaybackState) -> Self {
        let publisher = Self {
            observers: Vec::new(),
            shared,
            last: initial.clone(),
        };
        publisher.mirror(initial);
        publisher
    }

    #[cfg(test)]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Register `tx` and replay the current state to it alone.
    pub fn subscribe(
        &mut self,
        tx: Sender<PlayerEvent>,
        state: &PlaybackState,
        queue: (usize, Option<usize>),
    ) {
        let replay = [
            PlayerEvent::SongChanged(state.current.clone()),
            PlayerEvent::PlaybackStateChanged(state.is_playing),
            PlayerEvent::ModesChanged {
                shuffle: state.shuffle,
                repeat: state.repeat,
            },
            PlayerEvent::QueueChanged {
                len: queue.0,
                cursor: queue.1,
            },
            progress(state),
        ];
        for ev in replay {
            if tx.send(ev).is_err() {
                return;
            }
        }
        self.observers.push(tx);
    }

    /// Broadcast whatever changed since the previous call: song, play flag,
    /// modes, and (when the song or duration moved) progress.
    pub fn publish(&mut self, state: &PlaybackState) {
        self.mirror(state);
        let song_changed = song_id(state) != song_id(&self.last);
        if song_changed {
            self.broadcast(PlayerEvent::SongChanged(state.current.clone()));
        }
        if state.is_playing != self.last.is_playing {
            self.broadcast(PlayerEvent::PlaybackStateChanged(state.is_playing));
        }
        if state.shuffle != self.last.shuffle || state.repeat != self.last.repeat {
            self.broadcast(PlayerEvent::ModesChanged {
                shuffle: state.shuffle,
                repeat: state.repeat,
            });
        }
        if song_changed || state.duration_ms != self.last.duration_ms {
            self.broadcast(progress(state));
        }
        self.last = state.clone();
    }

    /// Broadcast the current position unconditionally.
    pub fn progress(&mut self, state: &PlaybackState) {
        self.mirror(state);
        self.broadcast(progress(state));
        self.last.position_ms = state.position_ms;
        self.last.duration_ms = state.duration_ms;
    }

    /// Refresh the shared snapshot without notifying observers.
    pub fn mirror(&self, state: &PlaybackState) {
        if let Ok(mut s) = self.shared.lock() {
            *s = state.clone();
        }
    }

    pub fn queue_changed(&mut self, len: usize, cursor: Option<usize>) {
        self.broadcast(PlayerEvent::QueueChanged { len, cursor });
    }

    pub fn notice(&mut self, text: impl Into<String>) {
        self.broadcast(PlayerEvent::Notice(text.into()));
    }

    fn broadcast(&mut self, ev: PlayerEvent) {
        self.observers.retain(|tx| tx.send(ev.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::types::RepeatMode;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    fn publisher() -> (Publisher, SharedState) {
        let shared: SharedState = Arc::new(Mutex::new(PlaybackState::default()));
        (
            Publisher::new(shared.clone(), &PlaybackState::default()),
            shared,
        )
    }

    #[test]
    fn subscribe_replays_current_state_first() {
        let (mut p, _) = publisher();
        let (tx, rx) = mpsc::channel();
        let state = PlaybackState {
            is_playing: true,
            shuffle: true,
            ..PlaybackState::default()
        };
        p.subscribe(tx, &state, (4, Some(2)));

        let got: Vec<PlayerEvent> = rx.try_iter().collect();
        assert_eq!(got[0], PlayerEvent::SongChanged(None));
        assert_eq!(got[1], PlayerEvent::PlaybackStateChanged(true));
        assert_eq!(
            got[2],
            PlayerEvent::ModesChanged {
                shuffle: true,
                repeat: RepeatMode::Off
            }
        );
        assert_eq!(got[3], PlayerEvent::QueueChanged { len: 4, cursor: Some(2) });
        assert_eq!(p.observer_count(), 1);
    }

    #[test]
    fn publish_only_sends_what_changed() {
        let (mut p, shared) = publisher();
        let (tx, rx) = mpsc::channel();
        p.subscribe(tx, &PlaybackState::default(), (0, None));
        rx.try_iter().for_each(drop);

        let mut state = PlaybackState::default();
        p.publish(&state);
        assert_eq!(rx.try_iter().count(), 0);

        state.is_playing = true;
        state.position_ms = 1234;
        p.publish(&state);
        let got: Vec<PlayerEvent> = rx.try_iter().collect();
        assert_eq!(got, vec![PlayerEvent::PlaybackStateChanged(true)]);
        assert_eq!(shared.lock().unwrap().position_ms, 1234);

        state.repeat = RepeatMode::All;
        p.publish(&state);
        let got: Vec<PlayerEvent> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![PlayerEvent::ModesChanged {
                shuffle: false,
                repeat: RepeatMode::All
            }]
        );
    }

    #[test]
    fn hung_up_observers_are_dropped() {
        let (mut p, _) = publisher();
        let (tx, rx) = mpsc::channel();
        p.subscribe(tx, &PlaybackState::default(), (0, None));
        drop(rx);
        p.notice("hello");
        assert_eq!(p.observer_count(), 0);
    }
}
