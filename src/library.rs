//! Music library: scanning a directory tree into `Track`s and grouping them
//! into per-folder playlists.

mod display;
mod folders;
mod model;
mod scan;

pub use display::LabelParts;
pub use folders::{FolderPlaylist, group_by_folder};
pub use model::Track;
pub use scan::scan;

#[cfg(test)]
mod tests;
