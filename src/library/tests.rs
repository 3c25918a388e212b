use super::display::{LabelParts, display_from_fields};
use super::*;
use crate::config::TrackDisplayField;
use std::path::{Path, PathBuf};

fn track_in(dir: &str, title: &str) -> Track {
    let path = PathBuf::from(dir).join(format!("{title}.mp3"));
    Track {
        id: model::track_id(&path),
        title: title.to_string(),
        artist: None,
        album: None,
        duration_ms: 0,
        uri: model::file_uri(&path),
        path,
        artwork: None,
        size: 0,
        added: 0,
        modified: 0,
        display: title.to_string(),
    }
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let p = Path::new("/tmp/Song.mp3");
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];
    assert_eq!(
        display_from_fields(p, "Song", Some("Artist"), None, &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(p, "Song", Some("  Artist  "), None, &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(display_from_fields(p, "Song", None, None, &fields, " - "), "Song");
}

#[test]
fn display_field_without_label_means_artist_dash_title() {
    let p = Path::new("/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(p, "Song", Some("Band"), None, &[TrackDisplayField::Display], "|"),
        "Band - Song"
    );
}

#[test]
fn compose_uses_existing_label_and_skips_empty_fields() {
    let parts = LabelParts {
        path: Path::new("/m/x.mp3"),
        title: "T",
        artist: Some("  "),
        album: Some("LP"),
        display: Some("Shown"),
    };
    assert_eq!(
        parts.compose(
            &[TrackDisplayField::Display, TrackDisplayField::Artist, TrackDisplayField::Album],
            " / "
        ),
        Some("Shown / LP".to_string())
    );
    assert_eq!(parts.compose(&[TrackDisplayField::Artist], " / "), None);
    assert_eq!(
        parts.compose(&[TrackDisplayField::Filename], ""),
        Some("x".to_string())
    );
}

#[test]
fn track_id_is_stable_and_path_sensitive() {
    let a = model::track_id(Path::new("/music/a.mp3"));
    assert_eq!(a, model::track_id(Path::new("/music/a.mp3")));
    assert_ne!(a, model::track_id(Path::new("/music/b.mp3")));
}

#[test]
fn group_by_folder_sorts_folders_by_name_and_keeps_track_order() {
    let tracks = vec![
        track_in("/m/rock", "b"),
        track_in("/m/Jazz", "a"),
        track_in("/m/rock", "a"),
        track_in("/m/ambient", "z"),
    ];

    let folders = group_by_folder(&tracks);
    let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["ambient", "Jazz", "rock"]);

    let rock = &folders[2];
    assert_eq!(rock.path, PathBuf::from("/m/rock"));
    let titles: Vec<&str> = rock.tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "a"]);
}

#[test]
fn group_by_folder_of_empty_library_is_empty() {
    assert!(group_by_folder(&[]).is_empty());
}

#[test]
fn folder_position_of_finds_track_by_id() {
    let tracks = vec![track_in("/m/x", "one"), track_in("/m/y", "two")];
    let folders = group_by_folder(&tracks);
    let id = tracks[1].id;
    let found = folders
        .iter()
        .enumerate()
        .find_map(|(fi, f)| f.position_of(id).map(|ti| (fi, ti)));
    assert_eq!(found, Some((1, 0)));
}
