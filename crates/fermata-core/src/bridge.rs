//! Background task bridge: session and feed bookkeeping for everything the
//! loop watches.
//!
//! Two hazards live here and nowhere else:
//!
//!   - a cancelled scan's late result must not touch a newer session's
//!     items, so every scan message is admitted against "is this epoch's
//!     handle still registered" before anything reads it
//!   - watches must stay one-receive-in-flight per channel, so re-arming
//!     goes through the session table, which refuses once the handle is
//!     cleared
//!
//! Cancellation is explicit: fire the token, drop the handle. Nothing is
//! cancelled implicitly by unrelated state transitions.

use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use fermata_model::boundary::{LibraryScanHandle, ScanHandle};
use fermata_model::playback::{DownloadEvent, PlayerEvent, RemoteCommand, ScrobbleRecord};
use fermata_model::scan::{LibraryProgress, ScanResult};

use crate::command::{share, Command, SharedReceiver};
use crate::message::Feed;

// ── Scan sessions ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ScanSession<T> {
    epoch: u64,
    rx: Option<SharedReceiver<T>>,
    cancel: CancellationToken,
    started: Instant,
}

impl<T> ScanSession<T> {
    fn new(epoch: u64, rx: SharedReceiver<T>, cancel: CancellationToken) -> Self {
        Self { epoch, rx: Some(rx), cancel, started: Instant::now() }
    }
}

/// At most one live session per scan kind; a shared epoch counter makes
/// every session distinguishable in logs and in messages.
#[derive(Debug, Default)]
pub struct TaskBridge {
    epoch: u64,
    search: Option<ScanSession<ScanResult>>,
    library: Option<ScanSession<LibraryProgress>>,
    library_last: Option<LibraryProgress>,
}

impl TaskBridge {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Search ────────────────────────────────────────────────────────────────

    /// Replace whatever search is running with this one. Returns the watch
    /// command for the new session.
    pub fn start_search(&mut self, handle: ScanHandle) -> Command {
        self.cancel_search();
        self.epoch += 1;
        let rx = share(handle.results);
        self.search = Some(ScanSession::new(self.epoch, rx.clone(), handle.cancel));
        info!("search session {} started", self.epoch);
        Command::WatchSearch { epoch: self.epoch, rx }
    }

    /// Fire the token and clear the handle. Late results for the old epoch
    /// will fail admission from here on.
    pub fn cancel_search(&mut self) {
        if let Some(session) = self.search.take() {
            session.cancel.cancel();
            debug!("search session {} cancelled", session.epoch);
        }
    }

    /// May a message for this epoch be applied?
    pub fn admit_search(&self, epoch: u64) -> bool {
        matches!(&self.search, Some(s) if s.epoch == epoch && s.rx.is_some())
    }

    /// Next single-receive watch for an admitted session.
    pub fn rearm_search(&self, epoch: u64) -> Option<Command> {
        match &self.search {
            Some(s) if s.epoch == epoch => {
                s.rx.clone().map(|rx| Command::WatchSearch { epoch, rx })
            }
            _ => None,
        }
    }

    /// The channel closed normally. True when it was the live session.
    pub fn finish_search(&mut self, epoch: u64) -> bool {
        if matches!(&self.search, Some(s) if s.epoch == epoch) {
            self.search = None;
            debug!("search session {} finished", epoch);
            return true;
        }
        false
    }

    pub fn search_running(&self) -> bool {
        self.search.is_some()
    }

    // ── Library scan ──────────────────────────────────────────────────────────

    pub fn start_library(&mut self, handle: LibraryScanHandle) -> Command {
        self.cancel_library();
        self.epoch += 1;
        let rx = share(handle.progress);
        self.library = Some(ScanSession::new(self.epoch, rx.clone(), handle.cancel));
        self.library_last = None;
        info!("library scan session {} started", self.epoch);
        Command::WatchLibrary { epoch: self.epoch, rx }
    }

    pub fn cancel_library(&mut self) {
        if let Some(session) = self.library.take() {
            session.cancel.cancel();
            debug!("library scan session {} cancelled", session.epoch);
        }
        self.library_last = None;
    }

    pub fn admit_library(&self, epoch: u64) -> bool {
        matches!(&self.library, Some(s) if s.epoch == epoch && s.rx.is_some())
    }

    pub fn rearm_library(&self, epoch: u64) -> Option<Command> {
        match &self.library {
            Some(s) if s.epoch == epoch => {
                s.rx.clone().map(|rx| Command::WatchLibrary { epoch, rx })
            }
            _ => None,
        }
    }

    /// Remember the latest progress step so the closing report has totals.
    pub fn record_library_progress(&mut self, progress: LibraryProgress) {
        self.library_last = Some(progress);
    }

    /// The progress channel closed. Returns the final progress plus elapsed
    /// seconds when this was the live session.
    pub fn finish_library(&mut self, epoch: u64) -> Option<(LibraryProgress, u64)> {
        let elapsed = match &self.library {
            Some(s) if s.epoch == epoch => s.started.elapsed().as_secs(),
            _ => return None,
        };
        self.library = None;
        debug!("library scan session {} finished", epoch);
        self.library_last.take().map(|last| (last, elapsed))
    }

    pub fn library_running(&self) -> bool {
        self.library.is_some()
    }
}

// ── Long-lived feeds ──────────────────────────────────────────────────────────

/// Feeds watched for the whole run: the player subscription, download
/// progress, scrobble retries, remote control. A closed feed goes quiet
/// permanently; scans above are the only re-startable producers.
#[derive(Debug, Default)]
pub struct Feeds {
    player: Option<SharedReceiver<PlayerEvent>>,
    downloads: Option<SharedReceiver<DownloadEvent>>,
    retries: Option<SharedReceiver<ScrobbleRecord>>,
    remote: Option<SharedReceiver<RemoteCommand>>,
}

impl Feeds {
    pub fn new(
        player: Option<mpsc::Receiver<PlayerEvent>>,
        downloads: Option<mpsc::Receiver<DownloadEvent>>,
        retries: Option<mpsc::Receiver<ScrobbleRecord>>,
        remote: Option<mpsc::Receiver<RemoteCommand>>,
    ) -> Self {
        Self {
            player: player.map(share),
            downloads: downloads.map(share),
            retries: retries.map(share),
            remote: remote.map(share),
        }
    }

    /// One watch per attached feed, issued at bootstrap.
    pub fn initial_watches(&self) -> Vec<Command> {
        [Feed::Player, Feed::Downloads, Feed::ScrobbleRetries, Feed::Remote]
            .into_iter()
            .filter_map(|feed| self.rearm(feed))
            .collect()
    }

    /// Next single-receive watch, unless the feed has closed.
    pub fn rearm(&self, feed: Feed) -> Option<Command> {
        match feed {
            Feed::Player => self.player.clone().map(|rx| Command::WatchPlayer { rx }),
            Feed::Downloads => self.downloads.clone().map(|rx| Command::WatchDownloads { rx }),
            Feed::ScrobbleRetries => self.retries.clone().map(|rx| Command::WatchRetries { rx }),
            Feed::Remote => self.remote.clone().map(|rx| Command::WatchRemote { rx }),
        }
    }

    pub fn close(&mut self, feed: Feed) {
        match feed {
            Feed::Player => self.player = None,
            Feed::Downloads => self.downloads = None,
            Feed::ScrobbleRetries => self.retries = None,
            Feed::Remote => self.remote = None,
        }
    }
}
