//! Debounced track transitions.
//!
//! Rapid jump requests (holding a cursor key in the queue pane) must not
//! start the audio backend once per keypress. While playback is active each
//! request bumps a global version and schedules a timer carrying that
//! version; only a timer whose version is still current starts playback, so
//! N requests inside the window collapse into one start at the final index.
//!
//! While stopped there is nothing to debounce: the cursor moves and no
//! timer is scheduled.

use std::time::Duration;

pub const SKIP_DEBOUNCE: Duration = Duration::from_millis(350);

/// What the caller should do with a jump request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// Playback inactive: move the cursor, persist, start nothing.
    CursorOnly,
    /// Deliver `SkipTimer { version }` after the debounce window.
    Scheduled { version: u64 },
}

#[derive(Debug, Clone, Copy)]
struct PendingSkip {
    index: usize,
    version: u64,
}

#[derive(Debug, Default)]
pub struct SkipDebouncer {
    version: u64,
    pending: Option<PendingSkip>,
}

impl SkipDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a jump to `index`. `active` is whether a track is currently
    /// loaded (Playing or Paused).
    pub fn request(&mut self, index: usize, active: bool) -> SkipOutcome {
        if !active {
            self.pending = None;
            return SkipOutcome::CursorOnly;
        }
        self.version += 1;
        self.pending = Some(PendingSkip { index, version: self.version });
        SkipOutcome::Scheduled { version: self.version }
    }

    /// A skip timer fired. Returns the index to start, or `None` when the
    /// timer was superseded by a later request or an invalidation.
    pub fn on_timeout(&mut self, version: u64) -> Option<usize> {
        if version != self.version {
            return None;
        }
        let pending = self.pending.take()?;
        Some(pending.index)
    }

    /// Drop any pending jump and poison in-flight timers. Used when
    /// something starts playback deliberately (Enter, remote command) so a
    /// half-elapsed timer cannot override it.
    pub fn invalidate(&mut self) {
        self.version += 1;
        self.pending = None;
    }

    pub fn pending_index(&self) -> Option<usize> {
        self.pending.map(|p| p.index)
    }
}
