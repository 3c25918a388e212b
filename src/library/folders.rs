use std::collections::BTreeMap;
use std::path::PathBuf;

use super::model::Track;

/// All tracks that live directly in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPlaylist {
    pub path: PathBuf,
    pub name: String,
    pub tracks: Vec<Track>,
}

impl FolderPlaylist {
    /// Position of the track with `id` inside this folder.
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }
}

/// Group `tracks` by parent directory.
///
/// Folders are ordered by name (case-insensitive, then by path); tracks keep
/// their incoming order inside each folder.
pub fn group_by_folder(tracks: &[Track]) -> Vec<FolderPlaylist> {
    let mut groups: BTreeMap<PathBuf, Vec<Track>> = BTreeMap::new();
    for t in tracks {
        groups
            .entry(t.folder().to_path_buf())
            .or_default()
            .push(t.clone());
    }

    let mut folders: Vec<FolderPlaylist> = groups
        .into_iter()
        .filter(|(_, tracks)| !tracks.is_empty())
        .map(|(path, tracks)| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            FolderPlaylist { path, name, tracks }
        })
        .collect();

    folders.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });
    folders
}
