//! Playback-related small types and handles.
//!
//! This module defines the repeat mode, the playback state published to
//! observers, and the command/event enums exchanged with the player thread.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::config::RepeatModeSetting;
use crate::library::Track;

use super::resume::ResumeState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop after the last track of the queue.
    #[default]
    Off,
    /// Restart the current track when it ends.
    One,
    /// Wrap around to the start of the queue.
    All,
}

impl RepeatMode {
    /// Next mode in the toggle order `Off -> All -> One -> Off`.
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(s: RepeatModeSetting) -> Self {
        match s {
            RepeatModeSetting::Off => Self::Off,
            RepeatModeSetting::One => Self::One,
            RepeatModeSetting::All => Self::All,
        }
    }
}

/// Everything observers need to render the player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    pub current: Option<Track>,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

/// Latest playback state, readable from any thread.
pub type SharedState = Arc<Mutex<PlaybackState>>;

#[derive(Debug)]
pub enum PlayerCmd {
    /// Replace the queue; optionally start playing at `start`.
    SetQueue {
        tracks: Vec<Track>,
        start: Option<usize>,
    },
    /// Load the queue entry at `index`, positioned at `start_ms`.
    PlayAt {
        index: usize,
        start_ms: u64,
        autoplay: bool,
    },
    Play,
    Pause,
    TogglePlayback,
    Stop,
    Next,
    Previous,
    /// Absolute seek in milliseconds.
    SeekTo(u64),
    /// Relative seek in seconds (positive or negative).
    SeekBy(i64),
    SetShuffle(bool),
    ToggleShuffle,
    SetRepeat(RepeatMode),
    CycleRepeat,
    /// Resume a previously persisted track/position.
    Restore(ResumeState),
    /// Register an observer; it immediately receives the current state.
    Subscribe(Sender<PlayerEvent>),
    /// Persist resume state and stop the thread, fading out over `fade_out_ms`.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    PlaybackStateChanged(bool),
    SongChanged(Option<Track>),
    Progress { position_ms: u64, duration_ms: u64 },
    ModesChanged { shuffle: bool, repeat: RepeatMode },
    QueueChanged { len: usize, cursor: Option<usize> },
    /// A non-fatal problem worth showing to the user.
    Notice(String),
}
