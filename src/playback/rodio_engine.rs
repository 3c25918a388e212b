//! `Engine` backed by a `rodio` output stream.
//!
//! Each loaded track gets its own paused `Sink`; seeking rebuilds the sink
//! and skips into the file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use crate::error::{Error, Result};
use crate::library::Track;

use super::engine::{Engine, EngineEvent};

const FADE_STEPS: u64 = 20;

/// Create a paused `Sink` for the file at `path` that starts at `start_at`.
fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>)> {
    let decode_err = |reason: String| Error::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| decode_err(e.to_string()))?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| decode_err(e.to_string()))?;
    let total = decoder.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}

struct Loaded {
    path: PathBuf,
    sink: Sink,
    /// Where the sink's source starts inside the file.
    offset: Duration,
}

pub struct RodioEngine {
    stream: OutputStream,
    loaded: Option<Loaded>,
    playing: bool,
    ended_reported: bool,
    /// Duration to report on the next poll after a load.
    pending_ready: Option<Option<Duration>>,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn open() -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| Error::AudioOutput(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which garbles the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            loaded: None,
            playing: false,
            ended_reported: false,
            pending_ready: None,
        })
    }
}

impl Engine for RodioEngine {
    fn load(&mut self, track: &Track, start_at: Duration) -> Result<Option<Duration>> {
        self.stop();
        let (sink, total) = create_sink_at(&self.stream, &track.path, start_at)?;
        debug!(path = %track.path.display(), ?start_at, "loaded");
        self.loaded = Some(Loaded {
            path: track.path.clone(),
            sink,
            offset: start_at,
        });
        self.ended_reported = false;
        self.pending_ready = Some(total);
        Ok(total)
    }

    fn play(&mut self) {
        if let Some(l) = &self.loaded {
            l.sink.play();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if let Some(l) = &self.loaded {
            l.sink.pause();
        }
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek(&mut self, to: Duration) -> Result<()> {
        let Some(current) = &self.loaded else {
            return Err(Error::Seek("nothing loaded".to_string()));
        };

        // Open the new sink first so a failed reopen leaves the old one playing.
        let (sink, _) = create_sink_at(&self.stream, &current.path, to)?;
        let path = current.path.clone();
        if let Some(old) = self.loaded.take() {
            old.sink.stop();
        }
        if self.playing {
            sink.play();
        }
        self.loaded = Some(Loaded {
            path,
            sink,
            offset: to,
        });
        self.ended_reported = false;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.loaded
            .as_ref()
            .map(|l| l.offset + l.sink.get_pos())
            .unwrap_or(Duration::ZERO)
    }

    fn stop(&mut self) {
        if let Some(l) = self.loaded.take() {
            l.sink.stop();
        }
        self.playing = false;
        self.pending_ready = None;
    }

    fn poll(&mut self) -> Option<EngineEvent> {
        if let Some(duration) = self.pending_ready.take() {
            return Some(EngineEvent::Ready { duration });
        }
        let l = self.loaded.as_ref()?;
        if self.playing && l.sink.empty() && !self.ended_reported {
            self.ended_reported = true;
            self.playing = false;
            return Some(EngineEvent::Ended);
        }
        None
    }

    fn fade_out(&mut self, over: Duration) {
        let Some(l) = &self.loaded else {
            return;
        };
        if !self.playing || over.is_zero() {
            l.sink.set_volume(0.0);
            return;
        }
        let step = Duration::from_millis((over.as_millis() as u64 / FADE_STEPS).max(1));
        for i in 1..=FADE_STEPS {
            let t = i as f32 / FADE_STEPS as f32;
            l.sink.set_volume(1.0 - t);
            thread::sleep(step);
        }
        l.sink.set_volume(0.0);
    }
}
