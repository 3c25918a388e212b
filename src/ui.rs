//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, View};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{LabelParts, Track};
use crate::playback::RepeatMode;

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "open/play".to_string());
    map.insert("esc".to_string(), "back".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("s".to_string(), "shuffle".to_string());
    map.insert("r".to_string(), "repeat".to_string());
    map.insert("n".to_string(), "now playing".to_string());
    map.insert("o".to_string(), "go to playing".to_string());
    map.insert("K".to_string(), "metadata".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating seek seconds.
fn controls_text(seek_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "esc", "space/p", "gg/G", "n", "o", "K", "s", "r", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] seek -/+{}s", seek_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    LabelParts {
        path: &track.path,
        title: &track.title,
        artist: track.artist.as_deref(),
        album: track.album.as_deref(),
        display: Some(&track.display),
    }
    .compose(&ui.now_playing_track_fields, &ui.now_playing_track_separator)
    .unwrap_or_else(|| track.display.clone())
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn repeat_label(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::Off => "REPEAT: Off",
        RepeatMode::All => "REPEAT: All",
        RepeatMode::One => "REPEAT: One",
    }
}

fn total_duration(app: &App) -> Option<Duration> {
    let ms = if app.duration_ms > 0 {
        app.duration_ms
    } else {
        app.now_playing.as_ref().map(|t| t.duration_ms).unwrap_or(0)
    };
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format a duration in milliseconds, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(ms: u64) -> String {
    if ms == 0 {
        return "-".to_string();
    }
    let total_secs = ms.div_ceil(1000);
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

/// Window of `total` rows that fits `height` and keeps `selected` centered
/// when possible: `(start, end, selected position inside the window)`.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, selected.min(total.saturating_sub(1)));
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

fn status_text(app: &App, ui: &UiSettings, notice: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();

    // cursor mode
    if app.follow_playback {
        parts.push(" CURSOR: Follow".to_string());
    } else {
        parts.push(" CURSOR: Free-roam".to_string());
    }

    parts.push(repeat_label(app.repeat).to_string());

    if app.shuffle {
        parts.push("Shuffle: ON".to_string());
    } else {
        parts.push("Shuffle: OFF".to_string());
    }

    // playback info
    if let Some(track) = &app.now_playing {
        let song = now_playing_track_text(track, ui);
        let elapsed = Duration::from_millis(app.position_ms);
        match now_playing_time_text(elapsed, total_duration(app), ui) {
            Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
            None => parts.push(format!("Song: {}", song)),
        }
        parts.push(if app.is_playing { "Playing" } else { "Paused" }.to_string());
    } else {
        parts.push("Stopped".to_string());
    }

    if !app.music_dir.is_empty() {
        parts.push(format!("Dir: {}", app.music_dir));
    }

    if let Some(n) = notice {
        parts.push(format!("! {}", n));
    }

    parts.join(" • ")
}

fn list_rows(app: &App) -> (String, Vec<String>) {
    let playing_id = app.now_playing.as_ref().map(|t| t.id);
    match app.view {
        View::Folders => {
            let rows = app
                .folders
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let mark = if app.playing_folder == Some(i) { "♪ " } else { "" };
                    format!("{}{} ({})", mark, f.name, f.tracks.len())
                })
                .collect();
            (" folders ".to_string(), rows)
        }
        View::Songs | View::NowPlaying => {
            let rows = app
                .visible_tracks()
                .iter()
                .map(|t| {
                    let here = app.open_folder == app.playing_folder || app.view == View::NowPlaying;
                    if here && Some(t.id) == playing_id {
                        format!("▶ {}", t.display)
                    } else {
                        t.display.clone()
                    }
                })
                .collect();
            let folder = match app.view {
                View::NowPlaying => app.playing_folder,
                _ => app.open_folder,
            };
            let name = folder
                .and_then(|i| app.folders.get(i))
                .map(|f| f.name.as_str())
                .unwrap_or("");
            let title = if app.view == View::NowPlaying {
                format!(" queue: {} ", name)
            } else {
                format!(" {} ", name)
            };
            (title, rows)
        }
    }
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let (title, rows) = list_rows(app);

    // Only build ListItems for the visible window (avoid allocating the entire list).
    let (start, end, selected_pos) =
        visible_window(rows.len(), area.height.saturating_sub(2) as usize, app.selected_row());
    let visible_items: Vec<ListItem> = rows[start..end]
        .iter()
        .map(|r| ListItem::new(r.as_str()))
        .collect();

    let empty = visible_items.is_empty();
    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if !empty {
        state.select(Some(selected_pos));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_now_playing(frame: &mut Frame, app: &App, area: Rect, ui: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let info = match &app.now_playing {
        Some(t) => format!(
            "{}\n{}\n{}",
            now_playing_track_text(t, ui),
            t.artist.as_deref().unwrap_or("-"),
            t.album.as_deref().unwrap_or("-"),
        ),
        None => "Nothing playing".to_string(),
    };
    let info_par = Paragraph::new(info)
        .block(Block::bordered().title(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(info_par, chunks[0]);

    let total = total_duration(app);
    let ratio = total
        .map(|t| (app.position_ms as f64 / t.as_millis() as f64).clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let label = now_playing_time_text(Duration::from_millis(app.position_ms), total, ui)
        .unwrap_or_default();
    let gauge = Gauge::default()
        .block(Block::bordered())
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, chunks[1]);

    draw_list(frame, app, chunks[2]);
}

fn draw_metadata(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_sized(72, 9, area);
    frame.render_widget(Clear, popup_area);

    let track = match app.view {
        View::Folders => app.now_playing.as_ref(),
        View::Songs | View::NowPlaying => app.selected_track(),
    };
    let meta = if let Some(track) = track {
        format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nPath: {}",
            track.title,
            track.artist.as_deref().unwrap_or("-"),
            track.album.as_deref().unwrap_or("-"),
            format_duration_mmss_ceil(track.duration_ms),
            track.path.display()
        )
    } else {
        "No track selected".to_string()
    };
    let meta_paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    notice: Option<&str>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());
    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app, ui_settings, notice))
        .slow_blink()
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    match app.view {
        View::NowPlaying => draw_now_playing(frame, app, chunks[2], ui_settings),
        View::Folders | View::Songs => draw_list(frame, app, chunks[2]),
    }

    // Keep the popup inside the list area so it doesn't cover header/status/footer.
    if app.metadata_window {
        draw_metadata(frame, app, chunks[2]);
    }

    let footer_text = controls_text(controls_settings.seek_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}
