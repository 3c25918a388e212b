use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

mod app;
mod config;
mod error;
mod library;
mod logging;
mod mpris;
mod playback;
mod runtime;
mod ui;

/// Terminal music player that plays a music directory folder by folder.
#[derive(Parser, Debug)]
#[command(name = "cadenza")]
#[command(version)]
struct Args {
    /// Music directory to scan (defaults to the current directory)
    #[arg(env = "CADENZA_MUSIC_DIR")]
    dir: Option<PathBuf>,

    /// Start fresh instead of resuming the last track
    #[arg(long)]
    no_resume: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (settings, settings_warning) = runtime::load_settings(args.config.as_deref());
    let log_file = logging::init(&settings.logging);
    if let Some(w) = &settings_warning {
        warn!("{w}");
    }

    let music_dir = match args.dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        dir = %music_dir.display(),
        log = ?log_file,
        "starting cadenza"
    );

    runtime::run(
        settings,
        runtime::Options {
            music_dir,
            resume: !args.no_resume,
        },
        settings_warning,
    )
}
