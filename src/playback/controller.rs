//! The playback service: queue, transport, modes and engine callbacks.
//!
//! A `Controller` is owned by exactly one thread. Every mutation goes through
//! its methods and every visible change is pushed out through the publisher.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::config::PlayerSettings;
use crate::library::Track;

use super::engine::{Engine, EngineEvent};
use super::policy::{self, EndAction};
use super::publisher::Publisher;
use super::queue::Queue;
use super::resume::{ResumeState, ResumeStore};
use super::types::{PlaybackState, PlayerCmd, PlayerEvent, RepeatMode, SharedState};

pub type BoxedStore = Box<dyn ResumeStore + Send>;

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

pub struct Controller<E: Engine> {
    engine: E,
    queue: Queue,
    state: PlaybackState,
    publisher: Publisher,
    store: Option<BoxedStore>,
    rng: StdRng,
    progress_interval: Duration,
    last_progress: Option<Instant>,
    /// Whether the engine currently holds `state.current`.
    loaded: bool,
}

impl<E: Engine> Controller<E> {
    pub fn new(
        engine: E,
        shared: SharedState,
        settings: &PlayerSettings,
        store: Option<BoxedStore>,
    ) -> Self {
        let state = PlaybackState {
            shuffle: settings.shuffle,
            repeat: settings.repeat.into(),
            ..PlaybackState::default()
        };
        Self {
            engine,
            queue: Queue::default(),
            publisher: Publisher::new(shared, &state),
            state,
            store,
            rng: StdRng::from_entropy(),
            progress_interval: Duration::from_millis(settings.progress_interval_ms),
            last_progress: None,
            loaded: false,
        }
    }

    /// Replace the shuffle RNG, e.g. with a seeded one.
    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[cfg(test)]
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Dispatch one command. Returns `false` once the controller has shut down.
    pub fn apply(&mut self, cmd: PlayerCmd) -> bool {
        match cmd {
            PlayerCmd::SetQueue { tracks, start } => self.set_queue(tracks, start),
            PlayerCmd::PlayAt {
                index,
                start_ms,
                autoplay,
            } => self.play_at(index, start_ms, autoplay),
            PlayerCmd::Play => self.play(),
            PlayerCmd::Pause => self.pause(),
            PlayerCmd::TogglePlayback => self.toggle_playback(),
            PlayerCmd::Stop => self.stop(),
            PlayerCmd::Next => self.next(),
            PlayerCmd::Previous => self.previous(),
            PlayerCmd::SeekTo(ms) => self.seek_to(ms),
            PlayerCmd::SeekBy(secs) => self.seek_by(secs),
            PlayerCmd::SetShuffle(on) => self.set_shuffle(on),
            PlayerCmd::ToggleShuffle => self.toggle_shuffle(),
            PlayerCmd::SetRepeat(mode) => self.set_repeat(mode),
            PlayerCmd::CycleRepeat => self.cycle_repeat(),
            PlayerCmd::Restore(resume) => self.restore(&resume),
            PlayerCmd::Subscribe(tx) => self.subscribe(tx),
            PlayerCmd::Quit { fade_out_ms } => {
                self.shutdown(Duration::from_millis(fade_out_ms));
                return false;
            }
        }
        true
    }

    pub fn subscribe(&mut self, tx: Sender<PlayerEvent>) {
        self.sync_position();
        self.publisher
            .subscribe(tx, &self.state, (self.queue.len(), self.queue.cursor()));
    }

    /// Swap the whole queue. With `start`, play that entry (clamped into
    /// range); otherwise the cursor follows the current track if the new
    /// queue contains it.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start: Option<usize>) {
        let current_id = self.state.current.as_ref().map(|t| t.id);
        self.queue.replace(tracks);
        debug!(len = self.queue.len(), ?start, "queue replaced");

        match start {
            Some(i) if !self.queue.is_empty() => {
                let i = i.min(self.queue.len() - 1);
                self.play_at(i, 0, true);
            }
            _ => {
                let cursor = current_id.and_then(|id| self.queue.position_of(id));
                self.queue.set_cursor(cursor);
                self.publish_queue();
            }
        }
    }

    pub fn play_at(&mut self, index: usize, start_ms: u64, autoplay: bool) {
        let Some(track) = self.queue.get(index).cloned() else {
            debug!(index, len = self.queue.len(), "play_at out of range");
            return;
        };

        self.queue.set_cursor(Some(index));
        self.last_progress = None;
        self.state.duration_ms = track.duration_ms;

        match self.engine.load(&track, Duration::from_millis(start_ms)) {
            Ok(total) => {
                self.loaded = true;
                if let Some(d) = total.map(millis).filter(|&d| d > 0) {
                    self.state.duration_ms = d;
                }
                if autoplay {
                    self.engine.play();
                }
                self.state.is_playing = self.engine.is_playing();
                self.state.position_ms = start_ms;
                info!(title = %track.title, index, start_ms, "track loaded");
                self.state.current = Some(track);
                self.publish_queue();
                self.publisher.publish(&self.state);
            }
            Err(e) => {
                error!(path = %track.path.display(), error = %e, "cannot load track");
                self.engine.stop();
                self.loaded = false;
                self.state.is_playing = false;
                self.state.position_ms = 0;
                let notice = format!("Cannot play {}: {e}", track.title);
                self.state.current = Some(track);
                self.publish_queue();
                self.publisher.publish(&self.state);
                self.publisher.notice(notice);
            }
        }
    }

    /// Resume the loaded track, or start the queue at the cursor (or 0).
    pub fn play(&mut self) {
        if self.loaded {
            self.engine.play();
            self.state.is_playing = self.engine.is_playing();
            self.publisher.publish(&self.state);
            return;
        }
        if self.queue.is_empty() {
            return;
        }
        let index = self.queue.cursor().unwrap_or(0);
        self.play_at(index, 0, true);
    }

    pub fn pause(&mut self) {
        if !self.loaded {
            return;
        }
        self.engine.pause();
        self.sync_position();
        self.state.is_playing = false;
        self.publisher.publish(&self.state);
    }

    pub fn toggle_playback(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Unload the engine; the cursor stays where it is.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.loaded = false;
        self.state.is_playing = false;
        self.state.position_ms = 0;
        self.publisher.publish(&self.state);
    }

    pub fn next(&mut self) {
        let picked = policy::next_index(
            self.queue.len(),
            self.queue.cursor(),
            self.state.shuffle,
            self.state.repeat,
            &mut self.rng,
        );
        if let Some(i) = picked {
            self.play_at(i, 0, true);
        }
    }

    pub fn previous(&mut self) {
        let picked = policy::previous_index(
            self.queue.len(),
            self.queue.cursor(),
            self.state.shuffle,
            &mut self.rng,
        );
        if let Some(i) = picked {
            self.play_at(i, 0, true);
        }
    }

    /// Absolute seek, clamped to the track length when it is known.
    pub fn seek_to(&mut self, ms: u64) {
        if !self.loaded {
            return;
        }
        let target = if self.state.duration_ms > 0 {
            ms.min(self.state.duration_ms)
        } else {
            ms
        };

        if let Err(e) = self.engine.seek(Duration::from_millis(target)) {
            warn!(error = %e, target, "seek failed, stopping");
            self.stop();
            self.publisher.notice(format!("Seek failed: {e}"));
            return;
        }
        self.state.position_ms = target;
        self.last_progress = Some(Instant::now());
        self.publisher.progress(&self.state);
    }

    /// Relative seek in seconds; never goes below zero.
    pub fn seek_by(&mut self, delta_secs: i64) {
        if !self.loaded {
            return;
        }
        self.sync_position();
        let target =
            (self.state.position_ms as i64).saturating_add(delta_secs.saturating_mul(1000));
        self.seek_to(target.max(0) as u64);
    }

    pub fn set_shuffle(&mut self, on: bool) {
        self.state.shuffle = on;
        self.publisher.publish(&self.state);
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.state.shuffle);
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.state.repeat = mode;
        self.publisher.publish(&self.state);
    }

    pub fn cycle_repeat(&mut self) {
        self.set_repeat(self.state.repeat.cycle());
    }

    pub fn handle_engine_event(&mut self, ev: EngineEvent) {
        match ev {
            EngineEvent::Ready { duration } => {
                if let Some(d) = duration.map(millis).filter(|&d| d > 0) {
                    self.state.duration_ms = d;
                    self.publisher.publish(&self.state);
                }
            }
            EngineEvent::Buffering => debug!("engine buffering"),
            EngineEvent::Ended => self.on_track_end(),
            EngineEvent::Error(reason) => {
                error!(%reason, "engine error");
                self.engine.pause();
                self.state.is_playing = false;
                self.publisher.publish(&self.state);
                self.publisher.notice(format!("Playback error: {reason}"));
            }
        }
    }

    fn on_track_end(&mut self) {
        let action = policy::on_track_end(
            self.queue.len(),
            self.queue.cursor(),
            self.state.shuffle,
            self.state.repeat,
            &mut self.rng,
        );
        debug!(?action, "track ended");
        match action {
            EndAction::Restart => {
                if let Some(c) = self.queue.cursor() {
                    self.play_at(c, 0, true);
                }
            }
            EndAction::Advance(i) => self.play_at(i, 0, true),
            EndAction::Stop => {
                info!("end of queue");
                self.stop();
            }
        }
    }

    /// Drain engine events, refresh the position, and publish progress when
    /// `progress_interval` has passed.
    pub fn tick(&mut self, now: Instant) {
        while let Some(ev) = self.engine.poll() {
            self.handle_engine_event(ev);
        }
        if !self.loaded {
            return;
        }

        self.sync_position();
        let due = self
            .last_progress
            .is_none_or(|t| now.duration_since(t) >= self.progress_interval);
        if self.state.is_playing && due {
            self.last_progress = Some(now);
            self.publisher.progress(&self.state);
        } else {
            self.publisher.mirror(&self.state);
        }
    }

    /// Load the persisted track (by id, then by uri) at its saved position.
    pub fn restore(&mut self, resume: &ResumeState) {
        let found = self
            .queue
            .position_of(resume.track_id)
            .or_else(|| self.queue.position_of_uri(&resume.uri));
        let Some(index) = found else {
            warn!(title = %resume.title, uri = %resume.uri, "resume track not in queue");
            return;
        };
        info!(title = %resume.title, position_ms = resume.position_ms, "resuming");
        self.play_at(index, resume.position_ms, resume.was_playing);
    }

    /// Persist the resume state, then fade out and release the engine.
    pub fn shutdown(&mut self, fade_out: Duration) {
        self.sync_position();
        if let (Some(track), Some(store)) = (&self.state.current, self.store.as_mut()) {
            let resume = ResumeState::new(track, self.state.position_ms, self.state.is_playing);
            match store.save(&resume) {
                Ok(()) => debug!(position_ms = resume.position_ms, "resume state persisted"),
                Err(e) => error!(error = %e, "cannot persist resume state"),
            }
        }

        if self.loaded && self.state.is_playing {
            self.engine.fade_out(fade_out);
        }
        self.engine.stop();
        self.loaded = false;
        self.state.is_playing = false;
        self.publisher.publish(&self.state);
        info!("player shut down");
    }

    fn sync_position(&mut self) {
        if self.loaded {
            self.state.position_ms = millis(self.engine.position());
        }
    }

    fn publish_queue(&mut self) {
        self.publisher
            .queue_changed(self.queue.len(), self.queue.cursor());
    }
}
