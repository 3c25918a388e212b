use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::PlayerSettings;
use crate::error::Result;

use super::controller::BoxedStore;
use super::engine::Engine;
use super::rodio_engine::RodioEngine;
use super::thread::spawn_player_thread;
use super::types::{PlaybackState, PlayerCmd, PlayerEvent, SharedState};

/// Handle to the player thread.
pub struct Player {
    tx: Sender<PlayerCmd>,
    shared: SharedState,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Start the player on the default audio output.
    pub fn spawn(settings: &PlayerSettings, store: Option<BoxedStore>) -> Result<Self> {
        Self::spawn_with(RodioEngine::open, settings, store)
    }

    pub fn spawn_with<E, F>(
        make_engine: F,
        settings: &PlayerSettings,
        store: Option<BoxedStore>,
    ) -> Result<Self>
    where
        E: Engine + 'static,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let shared: SharedState = Arc::new(Mutex::new(PlaybackState::default()));

        let handle = spawn_player_thread(make_engine, settings.clone(), shared.clone(), store, rx)?;

        Ok(Self {
            tx,
            shared,
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn shared_state(&self) -> SharedState {
        self.shared.clone()
    }

    /// Queue a command; `false` when the player thread is gone.
    pub fn send(&self, cmd: PlayerCmd) -> bool {
        self.tx.send(cmd).is_ok()
    }

    /// New observer channel, primed with the current state.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        self.send(PlayerCmd::Subscribe(tx));
        rx
    }

    /// Persist resume state, fade out and wait for the thread to finish.
    pub fn quit(&self, fade_out: Duration) {
        let _ = self.send(PlayerCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.quit(Duration::ZERO);
    }
}
