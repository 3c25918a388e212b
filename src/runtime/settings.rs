use std::path::Path;

use crate::config;

/// Load and validate settings. Failures fall back to defaults; the returned
/// message says why, for logging once the subscriber is up.
pub fn load_settings(config_path: Option<&Path>) -> (config::Settings, Option<String>) {
    let loaded = match config_path {
        Some(p) => config::Settings::load_from(Some(p)),
        None => config::Settings::load(),
    };
    match loaded {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                (
                    config::Settings::default(),
                    Some(format!("invalid config, using defaults: {msg}")),
                )
            } else {
                (s, None)
            }
        }
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}
