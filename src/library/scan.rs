use std::collections::HashMap;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use lofty::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::{Track, file_uri, track_id};

const ARTWORK_STEMS: [&str; 4] = ["cover", "folder", "front", "album"];
const ARTWORK_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_artwork_file(path: &Path) -> bool {
    let stem = path.file_stem().and_then(|s| s.to_str());
    let ext = path.extension().and_then(|s| s.to_str());
    match (stem, ext) {
        (Some(stem), Some(ext)) => {
            let stem = stem.to_ascii_lowercase();
            let ext = ext.to_ascii_lowercase();
            ARTWORK_STEMS.contains(&stem.as_str()) && ARTWORK_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Look for a cover image directly inside `dir`.
fn find_artwork(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_artwork_file(p))
        .collect();
    // Deterministic pick when a folder has several candidates.
    found.sort();
    found.into_iter().next()
}

fn unix_secs(t: std::io::Result<SystemTime>) -> Option<u64> {
    t.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

fn timestamps(meta: Option<&Metadata>) -> (u64, u64) {
    let Some(meta) = meta else {
        return (0, 0);
    };
    let modified = unix_secs(meta.modified()).unwrap_or(0);
    let added = unix_secs(meta.created()).unwrap_or(modified);
    (added, modified)
}

struct Tags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration_ms: u64,
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_tags(path: &Path) -> Tags {
    let mut tags = Tags {
        title: None,
        artist: None,
        album: None,
        duration_ms: 0,
    };

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            tags.duration_ms = tagged.properties().duration().as_millis() as u64;
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                tags.title = non_empty(tag.title());
                tags.artist = non_empty(tag.artist());
                tags.album = non_empty(tag.album());
            }
        }
        Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
    }

    tags
}

/// Walk `dir` and build a `Track` for every audio file accepted by `settings`.
///
/// Tracks are sorted by their display label, case-insensitively.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "music directory does not exist");
        return Vec::new();
    }

    let mut tracks: Vec<Track> = Vec::new();
    let mut artwork_cache: HashMap<PathBuf, Option<PathBuf>> = HashMap::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let tags = read_tags(path);
        let title = tags.title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("UNKNOWN")
                .to_string()
        });

        let meta = entry.metadata().ok();
        let (added, modified) = timestamps(meta.as_ref());
        let size = meta.as_ref().map(|m| m.len()).unwrap_or(0);

        let artwork = match path.parent() {
            Some(parent) => artwork_cache
                .entry(parent.to_path_buf())
                .or_insert_with(|| find_artwork(parent))
                .clone(),
            None => None,
        };

        let display = display_from_fields(
            path,
            &title,
            tags.artist.as_deref(),
            tags.album.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(Track {
            id: track_id(path),
            title,
            artist: tags.artist,
            album: tags.album,
            duration_ms: tags.duration_ms,
            uri: file_uri(path),
            path: path.to_path_buf(),
            artwork,
            size,
            added,
            modified,
            display,
        });
    }

    tracks.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
    info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}
