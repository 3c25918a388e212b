use std::error::Error;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::config;
use crate::library::{group_by_folder, scan};
use crate::mpris::ControlCmd;
use crate::playback::{BoxedStore, FileStore, Player};

mod event_loop;
mod settings;
mod startup;

pub use settings::load_settings;

/// Command-line choices that are not part of the config file.
pub struct Options {
    pub music_dir: PathBuf,
    pub resume: bool,
}

pub fn run(
    settings: config::Settings,
    opts: Options,
    startup_notice: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let tracks = scan(&opts.music_dir, &settings.library);
    let folders = group_by_folder(&tracks);
    info!(
        dir = %opts.music_dir.display(),
        tracks = tracks.len(),
        folders = folders.len(),
        "library ready"
    );

    let mut app = App::new(folders);
    app.follow_playback = settings.ui.follow_playback;
    app.music_dir = opts.music_dir.display().to_string();

    let state_path = config::resolve_state_path();
    let resume = if opts.resume && settings.player.resume {
        startup::load_resume(state_path.as_deref())
    } else {
        None
    };
    let store = state_path.map(|p| Box::new(FileStore::new(p)) as BoxedStore);

    // No audio output is fatal; report it before touching the terminal.
    let player = Player::spawn(&settings.player, store)?;
    let events = player.subscribe();

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    crate::mpris::spawn_mpris(control_tx.clone(), player.subscribe(), player.shared_state());

    let now = Instant::now();
    if let Some(n) = startup_notice {
        app.set_notice(n, now);
    }
    if !app.has_tracks() {
        app.set_notice(format!("No music found in {}", app.music_dir), now);
    }
    if let Some(resume) = resume {
        startup::restore_session(&mut app, &player, resume);
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();

        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &player,
            &events,
            &control_tx,
            &control_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
