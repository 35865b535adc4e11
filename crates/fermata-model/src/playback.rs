//! Playback vocabulary shared between the coordination core and the
//! audio-backend boundary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::track::Track;

// ── Status / repeat ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    /// Playing or Paused: a track is loaded and position/duration are live.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused  => "paused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
    /// Keep the queue fed from the recommender once it runs dry.
    Radio,
}

impl RepeatMode {
    pub fn cycle(self) -> Self {
        match self {
            Self::Off   => Self::All,
            Self::All   => Self::One,
            Self::One   => Self::Radio,
            Self::Radio => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off   => "off",
            Self::All   => "all",
            Self::One   => "one",
            Self::Radio => "radio",
        }
    }
}

// ── Player events ─────────────────────────────────────────────────────────────

/// What the audio backend reports through its event subscription. This is
/// the only completion-detection path: track endings arrive as
/// `TrackChanged` (backend advanced) or `StateChanged(Stopped)` (queue ran
/// out), never through a side channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackStatus),
    TrackChanged { index: usize, track: Track },
    Error(String),
    QueueChanged,
}

// ── Remote control ────────────────────────────────────────────────────────────

/// Media-key commands arriving from the OS integration (MPRIS on Linux).
/// Protocol encoding lives outside; these are already decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    PlayPause,
    Next,
    Previous,
    Stop,
    SeekBy(i64),
}

// ── Downloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    Queued,
    Active { percent: f32 },
    Complete { path: PathBuf },
    Failed(String),
}

/// One progress step for a transfer owned by the download collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadEvent {
    pub id: u64,
    pub label: String,
    pub status: DownloadStatus,
}

// ── Scrobbles ─────────────────────────────────────────────────────────────────

/// A finished-enough play, ready for submission to the listening-history
/// service. `played_at` is a UTC unix timestamp taken when the track started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrobbleRecord {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub album: String,
    pub duration_secs: u64,
    pub played_at: i64,
}

impl ScrobbleRecord {
    pub fn from_track(track: &Track, played_at: i64) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            album: track.album.clone(),
            duration_secs: track.duration_secs.unwrap_or(0),
            played_at,
        }
    }
}
