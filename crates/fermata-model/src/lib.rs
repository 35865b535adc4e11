//! Shared vocabulary for fermata: tracks, playback and scan types, the play
//! queue, configuration, platform paths, and the collaborator boundaries
//! the coordination core drives.

pub mod boundary;
pub mod config;
pub mod error;
pub mod platform;
pub mod playback;
pub mod queue;
pub mod scan;
pub mod session;
pub mod track;

pub use boundary::{Player, Recommender, ScanHandle, Scanner, ScrobbleSink, SessionStore};
pub use config::Config;
pub use playback::{PlaybackStatus, PlayerEvent, RepeatMode};
pub use queue::{PlayQueue, QueueSnapshot};
pub use track::{Playlist, Track};
