//! Collaborator boundaries.
//!
//! Everything the coordination loop drives but does not implement lives
//! behind one of these traits: the audio backend, the scanners, the
//! recommender, the scrobble sink, and the session store. The loop owns the
//! handles; blocking work (`Recommender::fill`, `ScrobbleSink::submit`)
//! only ever runs inside spawned command tasks, which is why those traits
//! take `&self` and require `Send + Sync`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{PlayerError, RecommendError, ScrobbleError, StoreError};
use crate::playback::{PlaybackStatus, PlayerEvent, ScrobbleRecord};
use crate::queue::QueueSnapshot;
use crate::scan::{LibraryProgress, ScanResult};
use crate::session::NavSnapshot;
use crate::track::{Playlist, SearchQuery, Track};

// ── Player ────────────────────────────────────────────────────────────────────

/// Facade over the audio backend. Calls never block; completion and track
/// changes come back through the event subscription, which is the single
/// authoritative signal for both.
pub trait Player: Send {
    fn play(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn toggle(&mut self) -> Result<(), PlayerError>;
    fn stop(&mut self) -> Result<(), PlayerError>;
    /// Relative seek, seconds. Out-of-range values clamp backend-side.
    fn seek(&mut self, delta_secs: i64);
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn status(&self) -> PlaybackStatus;
    /// Hand over the event stream. Yields `Some` exactly once; the bridge
    /// watches the receiver for the rest of the run.
    fn take_events(&mut self) -> Option<mpsc::Receiver<PlayerEvent>>;
}

// ── Scanner ───────────────────────────────────────────────────────────────────

/// A running search scan: batches plus the token that kills it.
pub struct ScanHandle {
    pub results: mpsc::Receiver<ScanResult>,
    pub cancel: CancellationToken,
}

/// A running library scan.
pub struct LibraryScanHandle {
    pub progress: mpsc::Receiver<LibraryProgress>,
    pub cancel: CancellationToken,
}

/// Factory for cancellable scans. Each call starts an independent producer
/// that must observe its token and close its channel when done or
/// cancelled.
pub trait Scanner: Send {
    fn search(&self, query: &SearchQuery) -> ScanHandle;
    fn scan_library(&self, roots: &[PathBuf]) -> LibraryScanHandle;
    /// Current contents of the indexed library, cheap in-memory snapshot.
    fn library_tracks(&self) -> Vec<Track>;
}

// ── Recommender ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecommendFill {
    pub tracks: Vec<Track>,
    /// Optional human-readable note about how the fill was produced.
    pub note: Option<String>,
}

/// Radio-mode track source. `fill` may block on network and is only called
/// from spawned tasks; the cheap seed/recents accessors are called from the
/// loop.
pub trait Recommender: Send + Sync {
    fn fill(&self, seed: &str, favorites: &[String]) -> Result<RecommendFill, RecommendError>;
    fn set_seed(&self, seed: &str);
    fn current_seed(&self) -> Option<String>;
    fn add_recent(&self, artist: &str);
    fn set_enabled(&self, enabled: bool);
    fn enabled(&self) -> bool;
}

// ── Scrobble sink ─────────────────────────────────────────────────────────────

/// Listening-history submission. The retry queue is persisted on the sink's
/// side; records it wants replayed arrive through `take_retries`.
pub trait ScrobbleSink: Send + Sync {
    fn submit(&self, record: &ScrobbleRecord) -> Result<(), ScrobbleError>;
    fn queue_retry(&self, record: &ScrobbleRecord);
    /// Hand over the retry feed. Yields `Some` exactly once.
    fn take_retries(&self) -> Option<mpsc::Receiver<ScrobbleRecord>>;
}

// ── Session store ─────────────────────────────────────────────────────────────

/// Fire-and-forget snapshot persistence. Save failures are logged by the
/// caller and never surfaced as popups.
pub trait SessionStore: Send + Sync {
    fn save_navigation(&self, nav: &NavSnapshot) -> Result<(), StoreError>;
    fn save_queue(&self, queue: &QueueSnapshot) -> Result<(), StoreError>;
    fn save_playlists(&self, playlists: &[Playlist]) -> Result<(), StoreError>;
    fn load_navigation(&self) -> Result<Option<NavSnapshot>, StoreError>;
    fn load_queue(&self) -> Result<Option<QueueSnapshot>, StoreError>;
    fn load_playlists(&self) -> Result<Vec<Playlist>, StoreError>;
}
