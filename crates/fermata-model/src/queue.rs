//! In-memory play queue with history.
//!
//! The queue is owned by the coordination loop and mutated only there.
//! Durable queue storage lives behind the session store; this structure
//! only has to get advance/wrap/undo semantics right:
//!
//!   - advance at the tail: Off/Radio stop (index untouched), All wraps to
//!     0, One stays put
//!   - undo/redo cover track-list edits, not repeat/shuffle flips
//!   - shuffle is a flag consulted by advance, not a stored permutation

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::playback::RepeatMode;
use crate::track::Track;

const HISTORY_CAP: usize = 32;

/// What the session store persists and restores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub repeat: RepeatMode,
    #[serde(default)]
    pub shuffle: bool,
}

#[derive(Debug, Clone)]
struct QueueChange {
    tracks: Vec<Track>,
    index: Option<usize>,
}

#[derive(Debug, Default)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    index: Option<usize>,
    repeat: RepeatMode,
    shuffle: bool,
    undo: VecDeque<QueueChange>,
    redo: Vec<QueueChange>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snap: QueueSnapshot) -> Self {
        let index = snap.index.filter(|i| *i < snap.tracks.len());
        Self {
            tracks: snap.tracks,
            index,
            repeat: snap.repeat,
            shuffle: snap.shuffle,
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.tracks.clone(),
            index: self.index,
            repeat: self.repeat,
            shuffle: self.shuffle,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&Track> {
        self.index.and_then(|i| self.tracks.get(i))
    }

    pub fn track_at(&self, i: usize) -> Option<&Track> {
        self.tracks.get(i)
    }

    /// A literal next track exists in queue order. Repeat wrap does not
    /// count; the radio prefetch trigger relies on that distinction.
    pub fn has_next(&self) -> bool {
        match self.index {
            Some(i) => i + 1 < self.tracks.len(),
            None => !self.tracks.is_empty(),
        }
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn set_shuffle(&mut self, on: bool) {
        self.shuffle = on;
    }

    // ── Edits (undoable) ──────────────────────────────────────────────────────

    pub fn add(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }
        self.remember();
        self.tracks.extend(tracks);
    }

    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.remember();
        self.tracks = tracks;
        self.index = None;
    }

    pub fn clear(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.remember();
        self.tracks.clear();
        self.index = None;
    }

    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(QueueChange { tracks: std::mem::take(&mut self.tracks), index: self.index });
        self.tracks = prev.tracks;
        self.index = prev.index.filter(|i| *i < self.tracks.len());
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let change = QueueChange { tracks: std::mem::take(&mut self.tracks), index: self.index };
        self.push_undo(change);
        self.tracks = next.tracks;
        self.index = next.index.filter(|i| *i < self.tracks.len());
        true
    }

    fn remember(&mut self) {
        let change = QueueChange { tracks: self.tracks.clone(), index: self.index };
        self.push_undo(change);
        self.redo.clear();
    }

    fn push_undo(&mut self, change: QueueChange) {
        if self.undo.len() == HISTORY_CAP {
            self.undo.pop_front();
        }
        self.undo.push_back(change);
    }

    // ── Cursor movement ───────────────────────────────────────────────────────

    pub fn jump_to(&mut self, i: usize) -> Option<&Track> {
        if i >= self.tracks.len() {
            return None;
        }
        self.index = Some(i);
        self.tracks.get(i)
    }

    /// Move to whatever plays after the current track, honoring repeat and
    /// shuffle. `None` means nothing follows (stop); the index is left
    /// untouched in that case.
    pub fn advance(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let next = match self.index {
            None => 0,
            Some(i) if self.repeat == RepeatMode::One => i,
            Some(i) if self.shuffle && self.tracks.len() > 1 => self.random_other(i),
            Some(i) if i + 1 < self.tracks.len() => i + 1,
            Some(_) if self.repeat == RepeatMode::All => 0,
            Some(_) => return None,
        };
        self.index = Some(next);
        self.tracks.get(next)
    }

    /// Step backwards in queue order. Wraps under RepeatAll, stops at 0
    /// otherwise.
    pub fn previous(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let prev = match self.index {
            None => 0,
            Some(0) if self.repeat == RepeatMode::All => self.tracks.len() - 1,
            Some(0) => return None,
            Some(i) => i - 1,
        };
        self.index = Some(prev);
        self.tracks.get(prev)
    }

    fn random_other(&self, current: usize) -> usize {
        let pick = rand::thread_rng().gen_range(0..self.tracks.len() - 1);
        if pick >= current {
            pick + 1
        } else {
            pick
        }
    }
}
