//! The seam between the playback controller and whatever renders audio.

use std::time::Duration;

use crate::error::Result;
use crate::library::Track;

/// State transitions reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A track finished loading; `duration` is the decoder's estimate.
    Ready { duration: Option<Duration> },
    Buffering,
    /// The loaded track played to its end.
    Ended,
    Error(String),
}

/// One decoding/rendering engine instance.
///
/// The controller drives it from a single thread, so implementations need
/// not be `Send`.
pub trait Engine {
    /// Open `track` positioned at `start_at`, paused. Returns the total
    /// duration when the decoder knows it.
    fn load(&mut self, track: &Track, start_at: Duration) -> Result<Option<Duration>>;

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// On error the previously loaded source, if any, is left in place.
    fn seek(&mut self, to: Duration) -> Result<()>;

    /// Position inside the loaded track.
    fn position(&self) -> Duration;

    /// Drop the loaded track.
    fn stop(&mut self);

    /// Next pending state transition, if any.
    fn poll(&mut self) -> Option<EngineEvent>;

    /// Lower the volume to silence over `over` before a stop.
    fn fade_out(&mut self, _over: Duration) {}
}
