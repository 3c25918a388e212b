//! Playback service.
//!
//! A `Controller` owns the queue, the engine and the playback state, and
//! lives on the player thread. Other threads talk to it through `Player`
//! (commands in, `PlayerEvent`s out) and may read the latest
//! `PlaybackState` snapshot through `SharedState`.

mod controller;
mod engine;
pub mod policy;
mod publisher;
mod queue;
mod resume;
mod rodio_engine;
mod thread;
mod types;

mod player;

pub use controller::{BoxedStore, Controller};
pub use engine::{Engine, EngineEvent};
pub use player::Player;
pub use resume::{FileStore, ResumeState, ResumeStore};
pub use rodio_engine::RodioEngine;
pub use types::{PlaybackState, PlayerCmd, PlayerEvent, RepeatMode, SharedState};

#[cfg(test)]
mod fake;
