//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the folder browser, the
//! selection and a mirror of the player state.

mod model;

pub use model::*;
