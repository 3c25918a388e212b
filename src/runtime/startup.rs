use std::path::Path;

use tracing::{info, warn};

use crate::app::App;
use crate::playback::{FileStore, Player, PlayerCmd, ResumeState, ResumeStore};

/// Read the persisted resume state; a corrupt file is logged and ignored.
pub fn load_resume(path: Option<&Path>) -> Option<ResumeState> {
    let path = path?;
    match FileStore::new(path.to_path_buf()).load() {
        Ok(state) => state,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring resume state");
            None
        }
    }
}

/// Queue the folder that holds the resumed track and hand the saved
/// position to the player. Returns `false` when the track is gone.
pub fn restore_session(app: &mut App, player: &Player, resume: ResumeState) -> bool {
    let Some((folder, track)) = app.find_track(resume.track_id, &resume.uri) else {
        info!(title = %resume.title, "resume track no longer in library");
        return false;
    };

    app.adopt_playing_folder(folder, track);
    player.send(PlayerCmd::SetQueue {
        tracks: app.folders[folder].tracks.clone(),
        start: None,
    });
    player.send(PlayerCmd::Restore(resume));
    true
}
