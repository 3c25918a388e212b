//! Scripted engine for controller and player-thread tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::library::Track;

use super::engine::{Engine, EngineEvent};

#[derive(Debug, Default)]
pub struct EngineLog {
    pub loads: Vec<(u64, Duration)>,
    pub loaded: Option<u64>,
    pub playing: bool,
    pub position: Duration,
    pub seeks: Vec<Duration>,
    pub stops: usize,
    pub fades: Vec<Duration>,
    /// Track ids whose load fails.
    pub fail: HashSet<u64>,
    /// Seeks fail and drop the loaded track.
    pub fail_seek: bool,
    /// Durations reported by `load`.
    pub durations: HashMap<u64, Duration>,
    pub pending: VecDeque<EngineEvent>,
}

/// Shares its log with the test so it stays inspectable after the engine
/// moves into a controller or thread.
#[derive(Clone, Default)]
pub struct FakeEngine {
    pub log: Arc<Mutex<EngineLog>>,
}

impl FakeEngine {
    pub fn log(&self) -> std::sync::MutexGuard<'_, EngineLog> {
        self.log.lock().unwrap()
    }
}

impl Engine for FakeEngine {
    fn load(&mut self, track: &Track, start_at: Duration) -> Result<Option<Duration>> {
        let mut log = self.log();
        log.loads.push((track.id, start_at));
        if log.fail.contains(&track.id) {
            log.loaded = None;
            log.playing = false;
            return Err(Error::Decode {
                path: track.path.clone(),
                reason: "unsupported format".to_string(),
            });
        }
        log.loaded = Some(track.id);
        log.playing = false;
        log.position = start_at;
        Ok(log.durations.get(&track.id).copied())
    }

    fn play(&mut self) {
        let mut log = self.log();
        log.playing = log.loaded.is_some();
    }

    fn pause(&mut self) {
        self.log().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.log.lock().unwrap().playing
    }

    fn seek(&mut self, to: Duration) -> Result<()> {
        let mut log = self.log();
        if log.loaded.is_none() {
            return Err(Error::Seek("nothing loaded".to_string()));
        }
        if log.fail_seek {
            log.loaded = None;
            return Err(Error::Seek("file vanished".to_string()));
        }
        log.seeks.push(to);
        log.position = to;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.log.lock().unwrap().position
    }

    fn stop(&mut self) {
        let mut log = self.log();
        log.loaded = None;
        log.playing = false;
        log.stops += 1;
    }

    fn poll(&mut self) -> Option<EngineEvent> {
        self.log().pending.pop_front()
    }

    fn fade_out(&mut self, over: Duration) {
        self.log().fades.push(over);
    }
}

pub fn track(id: u64) -> Track {
    let path = PathBuf::from(format!("/music/album/{id:02}.mp3"));
    Track {
        id,
        title: format!("Song {id}"),
        artist: Some("Band".to_string()),
        album: Some("Album".to_string()),
        duration_ms: 180_000,
        uri: format!("file://{}", path.display()),
        path,
        artwork: None,
        size: 1024,
        added: 0,
        modified: 0,
        display: format!("Song {id}"),
    }
}

pub fn tracks(n: u64) -> Vec<Track> {
    (1..=n).map(track).collect()
}
