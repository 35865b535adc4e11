use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One playable item, as the library or a scan hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

impl Track {
    /// A track known only by its file, as the browser hands them over
    /// before any tag read.
    pub fn untagged(path: PathBuf) -> Self {
        Self {
            path,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            duration_secs: None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    /// Display string for list panes: "Artist - Title", falling back to the
    /// file stem when tags are missing.
    pub fn display(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.artist, self.title),
            (true, false) => self.title.clone(),
            _ => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "?".to_string()),
        }
    }
}

/// A named, ordered track list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self { name: name.into(), tracks }
    }
}

/// What a search session should look at.
///
/// `root: Some(..)` walks that directory; `root: None` queries the indexed
/// library. Both kinds share one session slot, so starting either cancels
/// whichever was running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl SearchQuery {
    pub fn library(text: impl Into<String>) -> Self {
        Self { text: text.into(), root: None }
    }

    pub fn directory(text: impl Into<String>, root: PathBuf) -> Self {
        Self { text: text.into(), root: Some(root) }
    }
}
