//! Playback-driven policy: the once-per-track bookkeeping behind ticks,
//! scrobbling and radio refills.
//!
//! The loop consults this on every playback tick. All decisions are pure
//! state checks so they stay testable without a player:
//!
//!   - at most one tick timer is armed at a time, and only while playing
//!   - a track scrobbles once, at `min(duration / 2, 4 min)`, never for
//!     tracks under 30 s or without an authenticated account
//!   - a radio refill fires at most once per track, either when playback
//!     starts on the queue tail or when a radio-mode track nears its end
//!     with nothing queued after it

use fermata_model::playback::ScrobbleRecord;
use fermata_model::track::Track;
use std::time::Duration;

/// Cadence of the playback position poll.
pub const PLAYBACK_TICK: Duration = Duration::from_secs(1);

/// Tracks shorter than this never scrobble.
pub const SCROBBLE_MIN_TRACK_SECS: u64 = 30;
/// Upper bound on the scrobble threshold.
pub const SCROBBLE_CAP_SECS: u64 = 240;

/// Radio refill kicks in when this little of the last track remains.
pub const RADIO_REMAINING_SECS: u64 = 15;

// ── Per-track state ───────────────────────────────────────────────────────────

#[derive(Debug)]
struct ScrobbleState {
    record: ScrobbleRecord,
    /// Position at which the record submits. None marks an ineligible track.
    threshold: Option<u64>,
    submitted: bool,
}

impl ScrobbleState {
    fn new(track: &Track, played_at: i64) -> Self {
        let threshold = track
            .duration_secs
            .filter(|d| *d >= SCROBBLE_MIN_TRACK_SECS)
            .map(|d| (d / 2).min(SCROBBLE_CAP_SECS));
        Self { record: ScrobbleRecord::from_track(track, played_at), threshold, submitted: false }
    }
}

#[derive(Debug, Default)]
struct RadioFillState {
    triggered: bool,
}

// ── Policy ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PlaybackPolicy {
    scrobble: Option<ScrobbleState>,
    radio: RadioFillState,
    ticking: bool,
}

impl PlaybackPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new track started; all per-track bookkeeping resets.
    pub fn track_started(&mut self, track: &Track, played_at: i64) {
        self.scrobble = Some(ScrobbleState::new(track, played_at));
        self.radio = RadioFillState::default();
    }

    /// Playback stopped with no current track.
    pub fn track_cleared(&mut self) {
        self.scrobble = None;
        self.radio = RadioFillState::default();
    }

    /// True when a tick timer should be started now. Arms the flag, so a
    /// second call without an intervening tick stays false.
    pub fn arm_tick(&mut self, playing: bool) -> bool {
        if self.ticking || !playing {
            return false;
        }
        self.ticking = true;
        true
    }

    /// The armed tick arrived; the caller decides whether to re-arm.
    pub fn tick_received(&mut self) {
        self.ticking = false;
    }

    /// Returns the record to submit when the current position crosses the
    /// track's threshold. Submits at most once per track.
    pub fn scrobble_due(&mut self, position_secs: u64, authenticated: bool) -> Option<ScrobbleRecord> {
        if !authenticated {
            return None;
        }
        let state = self.scrobble.as_mut()?;
        if state.submitted || position_secs < state.threshold? {
            return None;
        }
        state.submitted = true;
        Some(state.record.clone())
    }

    /// Near-end refill check for radio mode. True at most once per track.
    pub fn radio_due(
        &mut self,
        position_secs: u64,
        duration_secs: Option<u64>,
        radio_mode: bool,
        has_next: bool,
    ) -> bool {
        if self.radio.triggered || !radio_mode || has_next {
            return false;
        }
        let Some(duration) = duration_secs else { return false };
        if duration.saturating_sub(position_secs) > RADIO_REMAINING_SECS {
            return false;
        }
        self.radio.triggered = true;
        true
    }

    /// Playback just started on the queue's last track; refill eagerly.
    /// Shares the once-per-track latch with [`Self::radio_due`].
    pub fn radio_tail_start(&mut self) -> bool {
        if self.radio.triggered {
            return false;
        }
        self.radio.triggered = true;
        true
    }
}
