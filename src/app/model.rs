//! Application model: the folder browser, the selection, and a mirror of the
//! player state built from `PlayerEvent`s.
//!
//! Nothing here talks to the player directly; actions that need playback
//! return the `PlayerCmd` to send.

use std::time::{Duration, Instant};

use crate::library::{FolderPlaylist, Track};
use crate::playback::{PlayerCmd, PlayerEvent, RepeatMode};

/// Which list the main pane shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Folders,
    Songs,
    /// The playing folder as a queue, with the current track highlighted.
    NowPlaying,
}

/// The main application model.
pub struct App {
    pub folders: Vec<FolderPlaylist>,
    pub view: View,
    /// View to return to when leaving `NowPlaying`.
    previous_view: View,

    pub folder_selected: usize,
    pub song_selected: usize,
    /// Folder whose songs are listed in `Songs`.
    pub open_folder: Option<usize>,
    /// Folder last handed to the player as its queue.
    pub playing_folder: Option<usize>,

    pub now_playing: Option<Track>,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub queue_cursor: Option<usize>,

    pub follow_playback: bool,
    pub metadata_window: bool,
    pub music_dir: String,

    notice: Option<(String, Instant)>,
}

impl App {
    pub fn new(folders: Vec<FolderPlaylist>) -> Self {
        Self {
            folders,
            view: View::Folders,
            previous_view: View::Folders,
            folder_selected: 0,
            song_selected: 0,
            open_folder: None,
            playing_folder: None,
            now_playing: None,
            is_playing: false,
            position_ms: 0,
            duration_ms: 0,
            shuffle: false,
            repeat: RepeatMode::Off,
            queue_cursor: None,
            follow_playback: true,
            metadata_window: false,
            music_dir: String::new(),
            notice: None,
        }
    }

    pub fn has_tracks(&self) -> bool {
        self.folders.iter().any(|f| !f.tracks.is_empty())
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Fold a player event into the mirrored state.
    pub fn apply_event(&mut self, ev: PlayerEvent, now: Instant) {
        match ev {
            PlayerEvent::PlaybackStateChanged(playing) => self.is_playing = playing,
            PlayerEvent::SongChanged(track) => {
                self.now_playing = track;
                self.position_ms = 0;
                if self.follow_playback {
                    self.follow_now_playing();
                }
            }
            PlayerEvent::Progress {
                position_ms,
                duration_ms,
            } => {
                self.position_ms = position_ms;
                self.duration_ms = duration_ms;
            }
            PlayerEvent::ModesChanged { shuffle, repeat } => {
                self.shuffle = shuffle;
                self.repeat = repeat;
            }
            PlayerEvent::QueueChanged { cursor, .. } => self.queue_cursor = cursor,
            PlayerEvent::Notice(text) => self.set_notice(text, now),
        }
    }

    pub fn set_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some((text.into(), now));
    }

    /// The current notice, unless it is older than `ttl`.
    pub fn notice(&self, now: Instant, ttl: Duration) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|(_, at)| now.saturating_duration_since(*at) < ttl)
            .map(|(text, _)| text.as_str())
    }

    /// Drop the notice once it has expired.
    pub fn expire_notice(&mut self, now: Instant, ttl: Duration) {
        if self.notice(now, ttl).is_none() {
            self.notice = None;
        }
    }

    /// Tracks listed in the current view (empty for `Folders`).
    pub fn visible_tracks(&self) -> &[Track] {
        let folder = match self.view {
            View::Folders => None,
            View::Songs => self.open_folder,
            View::NowPlaying => self.playing_folder,
        };
        folder
            .and_then(|i| self.folders.get(i))
            .map(|f| f.tracks.as_slice())
            .unwrap_or(&[])
    }

    /// Number of rows in the current view.
    pub fn row_count(&self) -> usize {
        match self.view {
            View::Folders => self.folders.len(),
            View::Songs | View::NowPlaying => self.visible_tracks().len(),
        }
    }

    /// The selected row in the current view.
    pub fn selected_row(&self) -> usize {
        match self.view {
            View::Folders => self.folder_selected,
            View::Songs | View::NowPlaying => self.song_selected,
        }
    }

    fn set_selected_row(&mut self, row: usize) {
        match self.view {
            View::Folders => self.folder_selected = row,
            View::Songs | View::NowPlaying => self.song_selected = row,
        }
    }

    /// The track under the cursor, if the view lists tracks.
    pub fn selected_track(&self) -> Option<&Track> {
        self.visible_tracks().get(self.song_selected)
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        let n = self.row_count();
        if n > 0 {
            self.set_selected_row((self.selected_row() + 1) % n);
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        let n = self.row_count();
        if n > 0 {
            let row = self.selected_row();
            self.set_selected_row(if row == 0 { n - 1 } else { row - 1 });
        }
    }

    pub fn select_first(&mut self) {
        self.set_selected_row(0);
    }

    pub fn select_last(&mut self) {
        self.set_selected_row(self.row_count().saturating_sub(1));
    }

    /// Enter: open the selected folder, or play the selected song.
    pub fn activate(&mut self) -> Option<PlayerCmd> {
        match self.view {
            View::Folders => {
                self.open_selected_folder();
                None
            }
            View::Songs => self.play_selected(),
            View::NowPlaying => {
                self.selected_track()?;
                self.follow_playback_on();
                Some(PlayerCmd::PlayAt {
                    index: self.song_selected,
                    start_ms: 0,
                    autoplay: true,
                })
            }
        }
    }

    fn open_selected_folder(&mut self) {
        if self.folder_selected >= self.folders.len() {
            return;
        }
        self.open_folder = Some(self.folder_selected);
        self.view = View::Songs;
        self.song_selected = 0;
        if self.open_folder == self.playing_folder {
            self.follow_now_playing();
        }
    }

    /// Play the selected song of the open folder. Re-queues the folder unless
    /// it is already the player's queue; does nothing when the selection is
    /// the track that is already playing.
    pub fn play_selected(&mut self) -> Option<PlayerCmd> {
        let folder_index = self.open_folder?;
        let track = self.folders.get(folder_index)?.tracks.get(self.song_selected)?;

        let same_folder = self.playing_folder == Some(folder_index);
        let already_playing =
            self.is_playing && self.now_playing.as_ref().is_some_and(|t| t.id == track.id);
        if same_folder && already_playing {
            return None;
        }

        self.follow_playback_on();
        if same_folder {
            return Some(PlayerCmd::PlayAt {
                index: self.song_selected,
                start_ms: 0,
                autoplay: true,
            });
        }

        self.playing_folder = Some(folder_index);
        Some(PlayerCmd::SetQueue {
            tracks: self.folders[folder_index].tracks.clone(),
            start: Some(self.song_selected),
        })
    }

    /// Esc/backspace: go up one level.
    pub fn back(&mut self) {
        match self.view {
            View::Folders => {}
            View::Songs => {
                if let Some(i) = self.open_folder {
                    self.folder_selected = i;
                }
                self.view = View::Folders;
            }
            View::NowPlaying => self.leave_now_playing(),
        }
    }

    pub fn toggle_now_playing(&mut self) {
        if self.view == View::NowPlaying {
            self.leave_now_playing();
            return;
        }
        if self.playing_folder.is_none() {
            return;
        }
        self.previous_view = self.view;
        self.view = View::NowPlaying;
        self.follow_now_playing();
    }

    fn leave_now_playing(&mut self) {
        self.view = self.previous_view;
        if self.view == View::Songs && self.open_folder == self.playing_folder {
            self.follow_now_playing();
        }
    }

    /// Open the playing folder with the cursor on the playing track.
    pub fn jump_to_playing(&mut self) {
        let Some(folder) = self.playing_folder else {
            return;
        };
        self.follow_playback_on();
        self.open_folder = Some(folder);
        self.folder_selected = folder;
        if self.view != View::NowPlaying {
            self.view = View::Songs;
        }
        self.follow_now_playing();
    }

    /// Put the song cursor on the playing track when the view lists the
    /// playing folder.
    fn follow_now_playing(&mut self) {
        let listing_playing = match self.view {
            View::Folders => false,
            View::Songs => self.open_folder.is_some() && self.open_folder == self.playing_folder,
            View::NowPlaying => true,
        };
        if !listing_playing {
            return;
        }
        let Some(id) = self.now_playing.as_ref().map(|t| t.id) else {
            return;
        };
        if let Some(pos) = self
            .playing_folder
            .and_then(|i| self.folders.get(i))
            .and_then(|f| f.position_of(id))
        {
            self.song_selected = pos;
        }
    }

    /// Locate a track by id, then by uri: `(folder index, track index)`.
    pub fn find_track(&self, id: u64, uri: &str) -> Option<(usize, usize)> {
        let by = |pred: &dyn Fn(&Track) -> bool| {
            self.folders.iter().enumerate().find_map(|(fi, f)| {
                f.tracks.iter().position(|t| pred(t)).map(|ti| (fi, ti))
            })
        };
        by(&|t| t.id == id).or_else(|| by(&|t| t.uri == uri))
    }

    /// Adopt `folder` as the playing queue and show it, e.g. after a resume.
    pub fn adopt_playing_folder(&mut self, folder: usize, track: usize) {
        if folder >= self.folders.len() {
            return;
        }
        self.playing_folder = Some(folder);
        self.open_folder = Some(folder);
        self.folder_selected = folder;
        self.song_selected = track;
        self.view = View::Songs;
    }
}
