use super::*;
use std::path::PathBuf;
use std::sync::mpsc;

use crate::playback::PlaybackState;

fn make_track() -> Track {
    Track {
        id: 0x1234,
        title: "Test Title".to_string(),
        artist: Some("Test Artist".to_string()),
        album: Some("Test Album".to_string()),
        duration_ms: 1_234,
        uri: "file:///tmp/music/test.mp3".to_string(),
        path: PathBuf::from("/tmp/music/test.mp3"),
        artwork: Some(PathBuf::from("/tmp/music/cover.jpg")),
        size: 0,
        added: 0,
        modified: 0,
        display: "Test Artist - Test Title".to_string(),
    }
}

fn iface() -> (PlayerIface, Arc<Mutex<MprisState>>, SharedState, mpsc::Receiver<ControlCmd>) {
    let state = Arc::new(Mutex::new(MprisState::default()));
    let playback: SharedState = Arc::new(Mutex::new(PlaybackState::default()));
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
        playback: playback.clone(),
    };
    (iface, state, playback, rx)
}

#[test]
fn song_changed_sets_and_clears_metadata() {
    let mut s = MprisState::default();
    let track = make_track();

    let changed = s.apply(&PlayerEvent::SongChanged(Some(track)));
    assert!(changed.metadata && changed.status);
    assert_eq!(s.title.as_deref(), Some("Test Title"));
    assert_eq!(s.artist, vec!["Test Artist".to_string()]);
    assert_eq!(s.album.as_deref(), Some("Test Album"));
    assert_eq!(s.url.as_deref(), Some("file:///tmp/music/test.mp3"));
    assert_eq!(s.art_url.as_deref(), Some("file:///tmp/music/cover.jpg"));
    assert_eq!(s.length_micros, Some(1_234_000));
    assert_eq!(
        s.track_id.as_ref().map(|p| p.as_str()),
        Some("/org/mpris/MediaPlayer2/track/0000000000001234")
    );

    s.shuffle = true;
    s.apply(&PlayerEvent::SongChanged(None));
    assert_eq!(s.title, None);
    assert!(s.artist.is_empty());
    assert_eq!(s.url, None);
    assert!(s.track_id.is_none());
    assert!(s.shuffle, "modes survive a cleared track");
}

#[test]
fn modes_only_flag_what_moved() {
    let mut s = MprisState::default();
    let changed = s.apply(&PlayerEvent::ModesChanged {
        shuffle: false,
        repeat: RepeatMode::All,
    });
    assert!(!changed.shuffle);
    assert!(changed.loop_status);

    let changed = s.apply(&PlayerEvent::Notice("hi".to_string()));
    assert!(!changed.any());
}

#[test]
fn progress_refreshes_the_length_once_known() {
    let mut s = MprisState::default();
    let mut track = make_track();
    track.duration_ms = 0;
    s.apply(&PlayerEvent::SongChanged(Some(track)));
    assert_eq!(s.length_micros, None);

    let changed = s.apply(&PlayerEvent::Progress {
        position_ms: 10,
        duration_ms: 5_000,
    });
    assert!(changed.metadata);
    assert_eq!(s.length_micros, Some(5_000_000));

    let changed = s.apply(&PlayerEvent::Progress {
        position_ms: 20,
        duration_ms: 5_000,
    });
    assert!(!changed.any());
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let (iface, state, _, _rx) = iface();
    assert_eq!(iface.playback_status(), "Stopped");

    state
        .lock()
        .unwrap()
        .apply(&PlayerEvent::SongChanged(Some(make_track())));
    assert_eq!(iface.playback_status(), "Paused");

    state
        .lock()
        .unwrap()
        .apply(&PlayerEvent::PlaybackStateChanged(true));
    assert_eq!(iface.playback_status(), "Playing");
}

#[test]
fn loop_status_names_round_trip() {
    for mode in [RepeatMode::Off, RepeatMode::One, RepeatMode::All] {
        assert_eq!(parse_loop_status(loop_status_name(mode)), Some(mode));
    }
    assert_eq!(parse_loop_status("Sometimes"), None);
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let (iface, state, _, _rx) = iface();
    assert!(iface.metadata().is_empty());

    state
        .lock()
        .unwrap()
        .apply(&PlayerEvent::SongChanged(Some(make_track())));

    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
        "mpris:artUrl",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn position_reads_the_player_snapshot_in_micros() {
    let (iface, _, playback, _rx) = iface();
    playback.lock().unwrap().position_ms = 2_500;
    assert_eq!(iface.position(), 2_500_000);
}

#[test]
fn methods_forward_control_commands() {
    let (mut iface, state, _, rx) = iface();
    iface.play_pause();
    iface.seek(-5_000_000);
    iface.set_shuffle(true);
    iface.set_loop_status("Track".to_string());
    iface.set_loop_status("bogus".to_string());

    let stale = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/00000000000000ff").unwrap();
    iface.set_position(stale, 1_000);

    state
        .lock()
        .unwrap()
        .apply(&PlayerEvent::SongChanged(Some(make_track())));
    let current = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/0000000000001234").unwrap();
    iface.set_position(current, 3_000_000);

    let got: Vec<ControlCmd> = rx.try_iter().collect();
    assert_eq!(
        got,
        vec![
            ControlCmd::PlayPause,
            ControlCmd::Seek(-5_000_000),
            ControlCmd::SetShuffle(true),
            ControlCmd::SetLoopStatus(RepeatMode::One),
            ControlCmd::SetPosition(3_000_000),
        ]
    );
}
