use super::load::{default_config_path, resolve_config_path, resolve_state_path, state_dir};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_cadenza_config_path() {
    let _lock = lock();
    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", "/tmp/cadenza-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/cadenza-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("cadenza")
            .join("config.toml")
    );
}

#[test]
fn state_paths_follow_xdg_state_home_then_home() {
    let _lock = lock();
    let _g0 = EnvGuard::remove("CADENZA_STATE_PATH");
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");
    assert_eq!(
        resolve_state_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-state/cadenza/resume.toml")
    );

    drop(_g1);
    let _g2 = EnvGuard::remove("XDG_STATE_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/cadenza")
    );

    let _g4 = EnvGuard::set("CADENZA_STATE_PATH", "/tmp/elsewhere.toml");
    assert_eq!(
        resolve_state_path().unwrap(),
        std::path::PathBuf::from("/tmp/elsewhere.toml")
    );
}

#[test]
fn settings_load_from_config_file_and_parse_repeat_aliases() {
    let _lock = lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[player]
shuffle = true
repeat = "repeat-one"
tick_ms = 100
progress_interval_ms = 500
resume = false
quit_fade_out_ms = 0

[controls]
seek_seconds = 9

[ui]
follow_playback = false
header_text = "hello"
notice_ms = 1500
now_playing_track_fields = ["artist", "title"]
now_playing_track_separator = " • "
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "

[library]
extensions = ["mp3"]
recursive = false
include_hidden = true
follow_links = false
display_fields = ["filename"]
display_separator = "::"

[logging]
level = "debug"
file = "/tmp/cadenza.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::remove("CADENZA__PLAYER__TICK_MS");

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert!(s.player.shuffle);
    assert_eq!(s.player.repeat, RepeatModeSetting::One);
    assert_eq!(s.player.tick_ms, 100);
    assert_eq!(s.player.progress_interval_ms, 500);
    assert!(!s.player.resume);
    assert_eq!(s.player.quit_fade_out_ms, 0);
    assert_eq!(s.controls.seek_seconds, 9);
    assert!(!s.ui.follow_playback);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.notice_ms, 1500);
    assert_eq!(s.ui.now_playing_track_fields.len(), 2);
    assert!(matches!(s.ui.now_playing_track_fields[0], TrackDisplayField::Artist));
    assert!(matches!(s.ui.now_playing_track_fields[1], TrackDisplayField::Title));
    assert_eq!(s.ui.now_playing_track_separator, " • ");
    assert!(matches!(s.ui.now_playing_time_fields[1], TimeField::Remaining));
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.display_separator, "::");
    assert!(matches!(s.library.display_fields[0], TrackDisplayField::Filename));
    assert_eq!(s.logging.level, "debug");
    assert_eq!(
        s.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/cadenza.log"))
    );
}

#[test]
fn repeat_setting_accepts_mpris_loop_status_names() {
    let _lock = lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(&cfg_path, "[player]\nrepeat = \"playlist\"\n").unwrap();

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert_eq!(s.player.repeat, RepeatModeSetting::All);
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[controls]
seek_seconds = 5
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA__CONTROLS__SEEK_SECONDS", "30");

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert_eq!(s.controls.seek_seconds, 30);
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = lock();
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(s.player.tick_ms, 200);
    assert_eq!(s.player.repeat, RepeatModeSetting::Off);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_progress_interval_below_tick() {
    let mut s = Settings::default();
    s.player.tick_ms = 500;
    s.player.progress_interval_ms = 100;
    assert!(s.validate().is_err());

    s.player.tick_ms = 1;
    s.player.progress_interval_ms = 1000;
    assert!(s.validate().is_err());
}
