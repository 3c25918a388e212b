//! File logging.
//!
//! The TUI owns stdout/stderr, so everything goes to a log file. The filter
//! comes from `CADENZA_LOG` when set, else from `logging.level`.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{self, LoggingSettings};

pub const FILTER_ENV: &str = "CADENZA_LOG";

/// Where the log file goes: `logging.file`, else `cadenza.log` in the state dir.
pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings
        .file
        .clone()
        .or_else(|| config::state_dir().map(|d| d.join("cadenza.log")))
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns the log file in use, or `None`
/// when it could not be opened (logging is then discarded).
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = log_path(settings)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    tracing_subscriber::registry()
        .with(filter(settings))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .ok()?;
    Some(path)
}
