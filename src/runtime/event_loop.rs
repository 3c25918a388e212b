use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::App;
use crate::config;
use crate::mpris::ControlCmd;
use crate::playback::{Player, PlayerCmd, PlayerEvent};
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input, UI drawing, player events and
/// MPRIS requests. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &Player,
    events: &mpsc::Receiver<PlayerEvent>,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let notice_ttl = Duration::from_millis(settings.ui.notice_ms);

    loop {
        let now = Instant::now();
        while let Ok(ev) = events.try_recv() {
            app.apply_event(ev, now);
        }
        app.expire_notice(now, notice_ttl);

        let notice = app.notice(now, notice_ttl).map(str::to_string);
        terminal.draw(|f| {
            ui::draw(f, app, notice.as_deref(), &settings.ui, &settings.controls)
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, app, player) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn quit(settings: &config::Settings, player: &Player) {
    player.quit(Duration::from_millis(settings.player.quit_fade_out_ms));
}

/// Translate a D-Bus request into a player command. With nothing queued
/// yet, play requests start the selected song.
fn control_to_player(cmd: ControlCmd, app: &mut App, position_ms: u64) -> Option<PlayerCmd> {
    let start_selected = |app: &mut App, fallback: PlayerCmd| {
        if app.playing_folder.is_none() {
            app.play_selected()
        } else {
            Some(fallback)
        }
    };

    match cmd {
        ControlCmd::Quit => None,
        ControlCmd::Play => start_selected(app, PlayerCmd::Play),
        ControlCmd::PlayPause => start_selected(app, PlayerCmd::TogglePlayback),
        ControlCmd::Pause => Some(PlayerCmd::Pause),
        ControlCmd::Stop => Some(PlayerCmd::Stop),
        ControlCmd::Next => {
            app.follow_playback_on();
            Some(PlayerCmd::Next)
        }
        ControlCmd::Prev => {
            app.follow_playback_on();
            Some(PlayerCmd::Previous)
        }
        ControlCmd::Seek(offset_us) => {
            let target = (position_ms as i64).saturating_add(offset_us / 1000);
            Some(PlayerCmd::SeekTo(target.max(0) as u64))
        }
        ControlCmd::SetPosition(us) => Some(PlayerCmd::SeekTo((us / 1000).max(0) as u64)),
        ControlCmd::SetShuffle(on) => Some(PlayerCmd::SetShuffle(on)),
        ControlCmd::SetLoopStatus(mode) => Some(PlayerCmd::SetRepeat(mode)),
    }
}

fn handle_control_cmd(
    cmd: ControlCmd,
    settings: &config::Settings,
    app: &mut App,
    player: &Player,
) -> bool {
    debug!(?cmd, "control command");
    if cmd == ControlCmd::Quit {
        quit(settings, player);
        return true;
    }

    let position_ms = player
        .shared_state()
        .lock()
        .map(|s| s.position_ms)
        .unwrap_or(app.position_ms);
    if let Some(pc) = control_to_player(cmd, app, position_ms) {
        player.send(pc);
    }
    false
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &Player,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    let seek_secs = settings.controls.seek_seconds.min(i64::MAX as u64) as i64;

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => {
            quit(settings, player);
            return true;
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => {
            if let Some(cmd) = app.activate() {
                player.send(cmd);
            }
        }
        KeyCode::Esc | KeyCode::Backspace => app.back(),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            player.send(PlayerCmd::SeekBy(seek_secs));
        }
        KeyCode::Char('H') => {
            player.send(PlayerCmd::SeekBy(-seek_secs));
        }
        KeyCode::Char('s') => {
            player.send(PlayerCmd::ToggleShuffle);
        }
        KeyCode::Char('r') => {
            player.send(PlayerCmd::CycleRepeat);
        }
        KeyCode::Char('n') => app.toggle_now_playing(),
        KeyCode::Char('o') => app.jump_to_playing(),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    false
}
