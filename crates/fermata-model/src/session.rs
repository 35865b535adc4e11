//! Session snapshots and the JSON-file store that ships with fermata.
//!
//! Snapshots are small and rewritten whole; writes go through a temp file
//! rename so a crash mid-write leaves the previous snapshot intact.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::boundary::SessionStore;
use crate::error::StoreError;
use crate::queue::QueueSnapshot;
use crate::track::Playlist;

// ── Snapshot types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum View {
    #[default]
    Library,
    Playlists,
    FileBrowser,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            Self::Library     => "library",
            Self::Playlists   => "playlists",
            Self::FileBrowser => "files",
        }
    }
}

/// Where the user was: restored at startup, saved on every cursor-relevant
/// change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavSnapshot {
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub library_cursor: usize,
    #[serde(default)]
    pub playlists_cursor: usize,
    #[serde(default)]
    pub browser_cursor: usize,
    #[serde(default)]
    pub browser_dir: Option<PathBuf>,
    #[serde(default)]
    pub queue_visible: bool,
}

// ── JSON store ────────────────────────────────────────────────────────────────

const NAV_FILE: &str = "navigation.json";
const QUEUE_FILE: &str = "queue.json";
const PLAYLISTS_FILE: &str = "playlists.json";

/// `SessionStore` over per-snapshot JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform data dir.
    pub fn at_data_dir() -> Self {
        Self::new(crate::platform::data_dir().join("session"))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        debug!("session snapshot written: {}", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for JsonStore {
    fn save_navigation(&self, nav: &NavSnapshot) -> Result<(), StoreError> {
        self.write_json(NAV_FILE, nav)
    }

    fn save_queue(&self, queue: &QueueSnapshot) -> Result<(), StoreError> {
        self.write_json(QUEUE_FILE, queue)
    }

    fn save_playlists(&self, playlists: &[Playlist]) -> Result<(), StoreError> {
        self.write_json(PLAYLISTS_FILE, &playlists)
    }

    fn load_navigation(&self) -> Result<Option<NavSnapshot>, StoreError> {
        self.read_json(NAV_FILE)
    }

    fn load_queue(&self) -> Result<Option<QueueSnapshot>, StoreError> {
        self.read_json(QUEUE_FILE)
    }

    fn load_playlists(&self) -> Result<Vec<Playlist>, StoreError> {
        Ok(self.read_json(PLAYLISTS_FILE)?.unwrap_or_default())
    }
}
