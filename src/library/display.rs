use std::path::Path;

use crate::config::TrackDisplayField;

/// The pieces of a track a label can be composed from.
pub struct LabelParts<'a> {
    pub path: &'a Path,
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    /// Pre-built display label, when one exists already.
    pub display: Option<&'a str>,
}

impl<'a> LabelParts<'a> {
    fn field(&self, field: TrackDisplayField) -> Option<String> {
        let trimmed = |s: &str| Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string);
        match field {
            TrackDisplayField::Display => match self.display {
                Some(d) => trimmed(d),
                // Without a label yet, "display" means "artist - title".
                None => {
                    let parts: Vec<String> = [self.artist.and_then(trimmed), trimmed(self.title)]
                        .into_iter()
                        .flatten()
                        .collect();
                    Some(parts.join(" - ")).filter(|s| !s.is_empty())
                }
            },
            TrackDisplayField::Title => trimmed(self.title),
            TrackDisplayField::Artist => self.artist.and_then(trimmed),
            TrackDisplayField::Album => self.album.and_then(trimmed),
            TrackDisplayField::Filename => self
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(trimmed),
            TrackDisplayField::Path => Some(self.path.display().to_string()),
        }
    }

    /// Join the requested `fields` with `sep`, or `None` when none produced text.
    pub fn compose(&self, fields: &[TrackDisplayField], sep: &str) -> Option<String> {
        let parts: Vec<String> = fields.iter().filter_map(|f| self.field(*f)).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(sep))
        }
    }
}

/// Build the list label for a freshly scanned file; falls back to `title`.
pub fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    LabelParts {
        path,
        title,
        artist,
        album,
        display: None,
    }
    .compose(fields, sep)
    .unwrap_or_else(|| title.to_string())
}
