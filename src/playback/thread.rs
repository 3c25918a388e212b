use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::PlayerSettings;
use crate::error::{Error, Result};

use super::controller::{BoxedStore, Controller};
use super::engine::Engine;
use super::types::{PlayerCmd, SharedState};

/// Start the player thread.
///
/// The engine is built by `make_engine` on the new thread, since audio
/// output streams are bound to the thread that opened them. Blocks until it
/// reports whether the engine opened.
pub(super) fn spawn_player_thread<E, F>(
    make_engine: F,
    settings: PlayerSettings,
    shared: SharedState,
    store: Option<BoxedStore>,
    rx: Receiver<PlayerCmd>,
) -> Result<JoinHandle<()>>
where
    E: Engine + 'static,
    F: FnOnce() -> Result<E> + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    let handle = thread::Builder::new()
        .name("cadenza-player".to_string())
        .spawn(move || {
            let engine = match make_engine() {
                Ok(e) => {
                    let _ = ready_tx.send(Ok(()));
                    e
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let controller = Controller::new(engine, shared, &settings, store);
            run(controller, rx, Duration::from_millis(settings.tick_ms));
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            let _ = handle.join();
            Err(Error::AudioOutput("player thread exited during startup".to_string()))
        }
    }
}

pub(super) fn run<E: Engine>(mut controller: Controller<E>, rx: Receiver<PlayerCmd>, tick: Duration) {
    info!(tick_ms = tick.as_millis() as u64, "player thread started");
    let mut last_tick = Instant::now();

    loop {
        match rx.recv_timeout(tick) {
            Ok(cmd) => {
                debug!(?cmd, "player command");
                if !controller.apply(cmd) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                controller.shutdown(Duration::ZERO);
                break;
            }
        }

        // A steady stream of commands must not starve the tick.
        let now = Instant::now();
        if now.duration_since(last_tick) >= tick {
            last_tick = now;
            controller.tick(now);
        }
    }
}
