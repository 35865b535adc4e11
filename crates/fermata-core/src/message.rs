//! Inbound message vocabulary.
//!
//! Every producer feeding the loop has exactly one variant group here: keys,
//! player events, the two timers, the two scan sessions, downloads, radio
//! fills, scrobbles, and remote control. Messages are consumed exactly once
//! by the dispatcher and carry everything the handler needs; none of them
//! borrow loop state.

use crossterm::event::KeyEvent;

use fermata_model::boundary::RecommendFill;
use fermata_model::error::{RecommendError, ScrobbleError};
use fermata_model::playback::{DownloadEvent, PlayerEvent, RemoteCommand, ScrobbleRecord};
use fermata_model::scan::{LibraryProgress, ScanResult};

/// Long-lived feeds that can end. Scans end per-session and carry their
/// epoch instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Player,
    Downloads,
    ScrobbleRetries,
    Remote,
}

impl Feed {
    pub fn label(self) -> &'static str {
        match self {
            Self::Player          => "player",
            Self::Downloads       => "downloads",
            Self::ScrobbleRetries => "scrobble-retries",
            Self::Remote          => "remote",
        }
    }
}

#[derive(Debug)]
pub enum Message {
    /// A key from the terminal.
    Key(KeyEvent),
    /// One event from the player subscription.
    Player(PlayerEvent),
    /// The 1-second playback tick.
    Tick,
    /// A debounce timer fired; stale unless `version` is still current.
    SkipTimer { version: u64 },
    /// A prefix timeout fired; stale unless `epoch` is still current.
    PrefixTimeout { epoch: u64 },
    /// One batch from the search scan session with this epoch.
    Search { epoch: u64, batch: ScanResult },
    /// The search channel for `epoch` closed.
    SearchClosed { epoch: u64 },
    /// One progress step from the library scan session with this epoch.
    Library { epoch: u64, progress: LibraryProgress },
    /// The library progress channel for `epoch` closed.
    LibraryClosed { epoch: u64 },
    /// Progress from the download collaborator.
    Download(DownloadEvent),
    /// A radio fill finished (possibly empty, possibly failed).
    Radio(Result<RecommendFill, RecommendError>),
    /// A scrobble submission finished.
    ScrobbleDone {
        record: ScrobbleRecord,
        outcome: Result<(), ScrobbleError>,
    },
    /// The sink wants this record re-submitted.
    ScrobbleRetry(ScrobbleRecord),
    /// A decoded OS media-control command.
    Remote(RemoteCommand),
    /// A long-lived feed closed; stop re-arming it.
    FeedClosed(Feed),
    /// Recognized and deliberately ignored.
    Noop,
}
