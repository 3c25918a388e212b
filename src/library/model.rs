use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// One playable audio file with its metadata.
///
/// Tracks are immutable once scanned and compare by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Stable identity derived from the file path.
    pub id: u64,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Duration in milliseconds, 0 when unknown.
    pub duration_ms: u64,
    /// Playable-content locator (`file://` URL).
    pub uri: String,
    pub path: PathBuf,
    /// Cover image found next to the file, if any.
    pub artwork: Option<PathBuf>,
    /// File size in bytes.
    pub size: u64,
    /// Unix seconds.
    pub added: u64,
    /// Unix seconds.
    pub modified: u64,
    pub display: String,
}

impl Track {
    /// Directory that holds this track.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Derive a stable id from a path: the first 8 bytes of its SHA-256 digest.
pub(crate) fn track_id(path: &Path) -> u64 {
    let digest = Sha256::digest(path.as_os_str().as_encoded_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub(crate) fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
