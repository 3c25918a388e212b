//! Error types shared by the library scanner, playback service and resume store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file could not be opened or decoded as audio.
    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// No usable audio output device.
    #[error("audio output error: {0}")]
    AudioOutput(String),

    /// The engine rejected a seek request.
    #[error("seek failed: {0}")]
    Seek(String),

    /// The persisted resume state could not be read or written.
    #[error("resume state format error: {0}")]
    StateFormat(String),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::StateFormat(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::StateFormat(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
