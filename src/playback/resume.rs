//! Persisted "where was I" state.
//!
//! Written when the player shuts down and read back on the next start so the
//! last track resumes at the same position.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::Result;
use crate::library::Track;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    #[serde(serialize_with = "id_to_hex", deserialize_with = "id_from_hex")]
    pub track_id: u64,
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub position_ms: u64,
    #[serde(default)]
    pub was_playing: bool,
}

impl ResumeState {
    pub fn new(track: &Track, position_ms: u64, was_playing: bool) -> Self {
        Self {
            track_id: track.id,
            uri: track.uri.clone(),
            title: track.title.clone(),
            artist: track.artist.clone().unwrap_or_default(),
            album: track.album.clone().unwrap_or_default(),
            position_ms,
            was_playing,
        }
    }
}

// TOML integers are signed 64-bit, so ids are stored as hex strings.
fn id_to_hex<S: Serializer>(id: &u64, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{id:016x}"))
}

fn id_from_hex<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    let s = String::deserialize(d)?;
    u64::from_str_radix(&s, 16).map_err(serde::de::Error::custom)
}

/// Durable storage for `ResumeState`.
pub trait ResumeStore {
    /// The saved state, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<ResumeState>>;

    fn save(&mut self, state: &ResumeState) -> Result<()>;
}

/// TOML file store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ResumeStore for FileStore {
    fn load(&self) -> Result<Option<ResumeState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let state: ResumeState = toml::from_str(&text)?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &ResumeState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let text = toml::to_string(state)?;

        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "resume state saved");
        Ok(())
    }
}
