//! Deferred work units.
//!
//! A `Command` is created inside the dispatcher, captures immutable
//! snapshots only (epochs, `Arc` handles, owned records), and resolves to at
//! most one [`Message`]. The runtime spawns one task per command; nothing
//! here ever touches loop-owned state.
//!
//! Watch commands receive exactly once. The receiver sits behind
//! `Arc<Mutex<..>>` so the session table keeps the authoritative handle
//! while one watch at a time holds it across an await; the dispatcher
//! re-arms after consuming each delivery.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use fermata_model::boundary::{Recommender, ScrobbleSink, SessionStore};
use fermata_model::error::{RecommendError, ScrobbleError};
use fermata_model::playback::{DownloadEvent, PlayerEvent, RemoteCommand, ScrobbleRecord};
use fermata_model::queue::QueueSnapshot;
use fermata_model::scan::{LibraryProgress, ScanResult};
use fermata_model::session::NavSnapshot;
use fermata_model::track::Playlist;

use crate::message::{Feed, Message};

pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

pub fn share<T>(rx: mpsc::Receiver<T>) -> SharedReceiver<T> {
    Arc::new(Mutex::new(rx))
}

pub enum Command {
    /// Sleep, then deliver the carried message.
    Delay { after: Duration, message: Message },
    WatchPlayer { rx: SharedReceiver<PlayerEvent> },
    WatchSearch { epoch: u64, rx: SharedReceiver<ScanResult> },
    WatchLibrary { epoch: u64, rx: SharedReceiver<LibraryProgress> },
    WatchDownloads { rx: SharedReceiver<DownloadEvent> },
    WatchRetries { rx: SharedReceiver<ScrobbleRecord> },
    WatchRemote { rx: SharedReceiver<RemoteCommand> },
    /// Ask the recommender for more tracks. Blocking; runs off the runtime
    /// threads.
    RadioFill {
        recommender: Arc<dyn Recommender>,
        seed: String,
        favorites: Vec<String>,
    },
    /// Submit one scrobble record.
    Scrobble {
        sink: Arc<dyn ScrobbleSink>,
        record: ScrobbleRecord,
    },
    /// Fire-and-forget navigation snapshot.
    SaveNavigation {
        store: Arc<dyn SessionStore>,
        nav: NavSnapshot,
    },
    /// Fire-and-forget queue snapshot.
    SaveQueue {
        store: Arc<dyn SessionStore>,
        queue: QueueSnapshot,
    },
    /// Fire-and-forget playlist collection snapshot.
    SavePlaylists {
        store: Arc<dyn SessionStore>,
        playlists: Vec<Playlist>,
    },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delay { .. }          => "delay",
            Self::WatchPlayer { .. }    => "watch-player",
            Self::WatchSearch { .. }    => "watch-search",
            Self::WatchLibrary { .. }   => "watch-library",
            Self::WatchDownloads { .. } => "watch-downloads",
            Self::WatchRetries { .. }   => "watch-retries",
            Self::WatchRemote { .. }    => "watch-remote",
            Self::RadioFill { .. }      => "radio-fill",
            Self::Scrobble { .. }       => "scrobble",
            Self::SaveNavigation { .. } => "save-navigation",
            Self::SaveQueue { .. }      => "save-queue",
            Self::SavePlaylists { .. }  => "save-playlists",
        }
    }

    /// Run to completion, yielding the message to feed back into the loop
    /// (or nothing, for fire-and-forget saves).
    pub async fn run(self) -> Option<Message> {
        match self {
            Self::Delay { after, message } => {
                tokio::time::sleep(after).await;
                Some(message)
            }

            Self::WatchPlayer { rx } => Some(match rx.lock().await.recv().await {
                Some(ev) => Message::Player(ev),
                None => Message::FeedClosed(Feed::Player),
            }),
            Self::WatchSearch { epoch, rx } => Some(match rx.lock().await.recv().await {
                Some(batch) => Message::Search { epoch, batch },
                None => Message::SearchClosed { epoch },
            }),
            Self::WatchLibrary { epoch, rx } => Some(match rx.lock().await.recv().await {
                Some(progress) => Message::Library { epoch, progress },
                None => Message::LibraryClosed { epoch },
            }),
            Self::WatchDownloads { rx } => Some(match rx.lock().await.recv().await {
                Some(ev) => Message::Download(ev),
                None => Message::FeedClosed(Feed::Downloads),
            }),
            Self::WatchRetries { rx } => Some(match rx.lock().await.recv().await {
                Some(record) => Message::ScrobbleRetry(record),
                None => Message::FeedClosed(Feed::ScrobbleRetries),
            }),
            Self::WatchRemote { rx } => Some(match rx.lock().await.recv().await {
                Some(cmd) => Message::Remote(cmd),
                None => Message::FeedClosed(Feed::Remote),
            }),

            Self::RadioFill { recommender, seed, favorites } => {
                let outcome =
                    tokio::task::spawn_blocking(move || recommender.fill(&seed, &favorites))
                        .await
                        .unwrap_or_else(|e| {
                            Err(RecommendError::Failed(format!("fill task: {e}")))
                        });
                Some(Message::Radio(outcome))
            }

            Self::Scrobble { sink, record } => {
                let submitted = record.clone();
                let outcome = tokio::task::spawn_blocking(move || sink.submit(&submitted))
                    .await
                    .unwrap_or_else(|e| Err(ScrobbleError::Failed(format!("submit task: {e}"))));
                Some(Message::ScrobbleDone { record, outcome })
            }

            Self::SaveNavigation { store, nav } => {
                let res = tokio::task::spawn_blocking(move || store.save_navigation(&nav)).await;
                match res {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("navigation snapshot failed: {}", e),
                    Err(e) => warn!("navigation snapshot task failed: {}", e),
                }
                None
            }
            Self::SaveQueue { store, queue } => {
                let res = tokio::task::spawn_blocking(move || store.save_queue(&queue)).await;
                match res {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("queue snapshot failed: {}", e),
                    Err(e) => warn!("queue snapshot task failed: {}", e),
                }
                None
            }
            Self::SavePlaylists { store, playlists } => {
                let res =
                    tokio::task::spawn_blocking(move || store.save_playlists(&playlists)).await;
                match res {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("playlist snapshot failed: {}", e),
                    Err(e) => warn!("playlist snapshot task failed: {}", e),
                }
                None
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delay { after, message } => write!(f, "Delay({:?}, {:?})", after, message),
            Self::WatchSearch { epoch, .. } => write!(f, "WatchSearch(epoch={epoch})"),
            Self::WatchLibrary { epoch, .. } => write!(f, "WatchLibrary(epoch={epoch})"),
            Self::RadioFill { seed, .. } => write!(f, "RadioFill(seed={seed:?})"),
            Self::Scrobble { record, .. } => {
                write!(f, "Scrobble({} - {})", record.artist, record.title)
            }
            other => write!(f, "{}", other.kind()),
        }
    }
}
