//! Scan vocabulary: what search and library-scan channels carry.

use serde::{Deserialize, Serialize};
use crate::track::Track;

/// One batch from a search scan. `done: true` marks the final batch; the
/// channel closes right after it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanResult {
    pub items: Vec<Track>,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPhase {
    Scanning,
    Processing,
    Cleaning,
    Done,
}

impl ScanPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Scanning   => "scanning",
            Self::Processing => "processing",
            Self::Cleaning   => "cleaning",
            Self::Done       => "done",
        }
    }
}

/// One step on the library-scan progress channel. Counters are cumulative.
/// `error` set means the scan died; the session ends and the message is
/// surfaced, whatever the phase says.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryProgress {
    pub phase: ScanPhase,
    pub added: u64,
    pub updated: u64,
    pub removed: u64,
    /// Path or unit currently being worked, for status display.
    pub current: Option<String>,
    pub error: Option<String>,
}

impl LibraryProgress {
    pub fn phase(phase: ScanPhase) -> Self {
        Self { phase, added: 0, updated: 0, removed: 0, current: None, error: None }
    }
}

/// Summary shown when a library scan finishes, built from the last progress
/// step the session saw.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanReport {
    pub added: u64,
    pub updated: u64,
    pub removed: u64,
    pub elapsed_secs: u64,
}

impl ScanReport {
    pub fn from_progress(last: &LibraryProgress, elapsed_secs: u64) -> Self {
        Self {
            added: last.added,
            updated: last.updated,
            removed: last.removed,
            elapsed_secs,
        }
    }
}
