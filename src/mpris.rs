use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::playback::{PlayerEvent, RepeatMode, SharedState};

const BUS_NAME: &str = "org.mpris.MediaPlayer2.cadenza";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Requests coming in from D-Bus clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in microseconds.
    SetPosition(i64),
    SetShuffle(bool),
    SetLoopStatus(RepeatMode),
}

/// Which property groups changed and need a `PropertiesChanged` signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Changed {
    status: bool,
    metadata: bool,
    shuffle: bool,
    loop_status: bool,
}

impl Changed {
    fn any(&self) -> bool {
        self.status || self.metadata || self.shuffle || self.loop_status
    }

    fn merge(&mut self, other: Changed) {
        self.status |= other.status;
        self.metadata |= other.metadata;
        self.shuffle |= other.shuffle;
        self.loop_status |= other.loop_status;
    }
}

#[derive(Debug, Default)]
struct MprisState {
    playing: bool,
    has_track: bool,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    shuffle: bool,
    repeat: RepeatMode,
}

fn track_object_path(id: u64) -> Option<OwnedObjectPath> {
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{id:016x}"))
        .ok()
        .map(OwnedObjectPath::from)
}

impl MprisState {
    fn set_track(&mut self, track: Option<&Track>) {
        let Some(t) = track else {
            *self = MprisState {
                shuffle: self.shuffle,
                repeat: self.repeat,
                ..MprisState::default()
            };
            return;
        };
        self.has_track = true;
        self.title = Some(t.title.clone());
        self.artist = t.artist.iter().cloned().collect();
        self.album = t.album.clone();
        self.url = Some(t.uri.clone());
        self.art_url = t.artwork.as_ref().map(|p| format!("file://{}", p.display()));
        self.length_micros = (t.duration_ms > 0).then(|| t.duration_ms as i64 * 1000);
        self.track_id = track_object_path(t.id);
    }

    /// Fold one player event into the exported state.
    fn apply(&mut self, ev: &PlayerEvent) -> Changed {
        let mut changed = Changed::default();
        match ev {
            PlayerEvent::SongChanged(track) => {
                self.set_track(track.as_ref());
                changed.metadata = true;
                changed.status = true;
            }
            PlayerEvent::PlaybackStateChanged(playing) => {
                self.playing = *playing;
                changed.status = true;
            }
            PlayerEvent::ModesChanged { shuffle, repeat } => {
                changed.shuffle = self.shuffle != *shuffle;
                changed.loop_status = self.repeat != *repeat;
                self.shuffle = *shuffle;
                self.repeat = *repeat;
            }
            PlayerEvent::Progress { duration_ms, .. } => {
                let length = (*duration_ms > 0).then(|| *duration_ms as i64 * 1000);
                if self.has_track && length != self.length_micros {
                    self.length_micros = length;
                    changed.metadata = true;
                }
            }
            PlayerEvent::QueueChanged { .. } | PlayerEvent::Notice(_) => {}
        }
        changed
    }

    fn status(&self) -> &'static str {
        match (self.has_track, self.playing) {
            (_, true) => "Playing",
            (true, false) => "Paused",
            (false, false) => "Stopped",
        }
    }
}

fn loop_status_name(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::Off => "None",
        RepeatMode::One => "Track",
        RepeatMode::All => "Playlist",
    }
}

fn parse_loop_status(name: &str) -> Option<RepeatMode> {
    match name {
        "None" => Some(RepeatMode::Off),
        "Track" => Some(RepeatMode::One),
        "Playlist" => Some(RepeatMode::All),
        _ => None,
    }
}

fn insert_value<'a>(map: &mut HashMap<String, OwnedValue>, key: &str, value: impl Into<Value<'a>>) {
    if let Ok(v) = OwnedValue::try_from(value.into()) {
        map.insert(key.to_string(), v);
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "cadenza"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<MprisState>>,
    /// Player snapshot, for the position (which is never signalled).
    playback: SharedState,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    /// Ignored unless `track_id` names the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self
            .state
            .lock()
            .ok()
            .and_then(|s| s.track_id.clone());
        match current {
            Some(id) if id.as_str() == track_id.as_str() && position >= 0 => {
                let _ = self.tx.send(ControlCmd::SetPosition(position));
            }
            _ => debug!(%track_id, "SetPosition for a stale track ignored"),
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        s.status()
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "None";
        };
        loop_status_name(s.repeat)
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        match parse_loop_status(&value) {
            Some(mode) => {
                let _ = self.tx.send(ControlCmd::SetLoopStatus(mode));
            }
            None => warn!(%value, "unknown LoopStatus"),
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state.lock().map(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        let _ = self.tx.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.playback
            .lock()
            .map(|s| s.position_ms as i64 * 1000)
            .unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(id) = &s.track_id {
            insert_value(&mut map, "mpris:trackid", id.clone());
        }
        if let Some(title) = &s.title {
            insert_value(&mut map, "xesam:title", title.clone());
        }
        if !s.artist.is_empty() {
            insert_value(&mut map, "xesam:artist", s.artist.clone());
        }
        if let Some(album) = &s.album {
            insert_value(&mut map, "xesam:album", album.clone());
        }
        if let Some(url) = &s.url {
            insert_value(&mut map, "xesam:url", url.clone());
        }
        if let Some(len) = s.length_micros {
            insert_value(&mut map, "mpris:length", len);
        }
        if let Some(art) = &s.art_url {
            insert_value(&mut map, "mpris:artUrl", art.clone());
        }
        map
    }
}

async fn emit_changes(iface_ref: &InterfaceRef<PlayerIface>, changed: Changed) -> zbus::Result<()> {
    let emitter = iface_ref.signal_emitter();
    let iface = iface_ref.get().await;
    if changed.status {
        iface.playback_status_changed(emitter).await?;
    }
    if changed.metadata {
        iface.metadata_changed(emitter).await?;
    }
    if changed.shuffle {
        iface.shuffle_changed(emitter).await?;
    }
    if changed.loop_status {
        iface.loop_status_changed(emitter).await?;
    }
    Ok(())
}

async fn serve(
    tx: Sender<ControlCmd>,
    events: Receiver<PlayerEvent>,
    state: Arc<Mutex<MprisState>>,
    playback: SharedState,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(
            OBJECT_PATH,
            PlayerIface {
                tx,
                state: state.clone(),
                playback,
            },
        )
        .await?;
    let iface_ref = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    info!(name = BUS_NAME, "MPRIS service registered");

    loop {
        let mut changed = Changed::default();
        loop {
            match events.try_recv() {
                Ok(ev) => {
                    if let Ok(mut s) = state.lock() {
                        changed.merge(s.apply(&ev));
                    }
                }
                Err(TryRecvError::Empty) => break,
                // Player is gone; the process is shutting down.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        if changed.any() {
            if let Err(e) = emit_changes(&iface_ref, changed).await {
                warn!(error = %e, "cannot emit PropertiesChanged");
            }
        }
        Timer::after(PUMP_INTERVAL).await;
    }
}

/// Export the player on the session bus from a background thread.
///
/// `events` is a player subscription; D-Bus requests arrive on `tx`. Bus
/// failures only disable the integration.
pub fn spawn_mpris(tx: Sender<ControlCmd>, events: Receiver<PlayerEvent>, playback: SharedState) {
    let state = Arc::new(Mutex::new(MprisState::default()));

    let spawned = std::thread::Builder::new()
        .name("cadenza-mpris".to_string())
        .spawn(move || {
            if let Err(e) = block_on(serve(tx, events, state, playback)) {
                warn!(error = %e, "MPRIS disabled");
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "cannot start MPRIS thread");
    }
}

#[cfg(test)]
mod tests;
