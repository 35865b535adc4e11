//! Typed failures for the collaborator boundaries.
//!
//! Tiering matters more than the shapes here: expected conditions (empty
//! queue, no selection) never construct one of these — they are handled as
//! silent no-ops at the call site. These types exist for the operational
//! failures that either reach the error popup or end a background session.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to start playback of {path}: {reason}")]
    Start { path: PathBuf, reason: String },
    #[error("audio backend unavailable: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("recommendation service failed: {0}")]
    Failed(String),
    #[error("recommendation service is disabled")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum ScrobbleError {
    #[error("scrobble submission failed: {0}")]
    Failed(String),
    #[error("no scrobble identity configured")]
    NotAuthenticated,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store encoding: {0}")]
    Encode(#[from] serde_json::Error),
}
