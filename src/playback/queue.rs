//! The play queue: an ordered list of tracks plus the "current" cursor.
//!
//! The track list is only ever replaced wholesale; the cursor belongs to the
//! controller and always points inside the list (or nowhere).

use crate::library::Track;

#[derive(Debug, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
}

impl Queue {
    /// Swap in a new track list and clear the cursor.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Point the cursor at `index`; out-of-range indices clear it.
    pub fn set_cursor(&mut self, index: Option<usize>) {
        self.cursor = index.filter(|&i| i < self.tracks.len());
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }

    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn position_of_uri(&self, uri: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.uri == uri)
    }
}
