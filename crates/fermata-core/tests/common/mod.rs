#![allow(dead_code)]

//! In-memory collaborators for driving the loop in integration tests.
//!
//! Each fake records what the loop asked of it behind `Arc<Mutex<..>>`
//! probes, so tests keep a handle after the `App` takes ownership.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use fermata_core::{App, Collaborators, Command, Message};
use fermata_model::boundary::{
    LibraryScanHandle, Player, RecommendFill, Recommender, ScanHandle, Scanner, ScrobbleSink,
    SessionStore,
};
use fermata_model::config::Config;
use fermata_model::error::{PlayerError, RecommendError, ScrobbleError, StoreError};
use fermata_model::playback::{
    DownloadEvent, PlaybackStatus, PlayerEvent, RemoteCommand, ScrobbleRecord,
};
use fermata_model::queue::QueueSnapshot;
use fermata_model::scan::{LibraryProgress, ScanResult};
use fermata_model::session::NavSnapshot;
use fermata_model::track::{Playlist, SearchQuery, Track};

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct PlayerProbe {
    plays: Arc<Mutex<Vec<PathBuf>>>,
    stops: Arc<Mutex<usize>>,
    seeks: Arc<Mutex<Vec<i64>>>,
    status: Arc<Mutex<PlaybackStatus>>,
    position: Arc<Mutex<Option<Duration>>>,
    duration: Arc<Mutex<Option<Duration>>>,
    refuse_play: Arc<Mutex<bool>>,
}

impl PlayerProbe {
    pub fn plays(&self) -> Vec<PathBuf> {
        self.plays.lock().unwrap().clone()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }

    pub fn seeks(&self) -> Vec<i64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn set_status(&self, status: PlaybackStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_position(&self, secs: u64) {
        *self.position.lock().unwrap() = Some(Duration::from_secs(secs));
    }

    pub fn set_duration(&self, secs: u64) {
        *self.duration.lock().unwrap() = Some(Duration::from_secs(secs));
    }

    pub fn refuse_plays(&self) {
        *self.refuse_play.lock().unwrap() = true;
    }
}

pub struct FakePlayer {
    probe: PlayerProbe,
    volume: f32,
    events: Option<mpsc::Receiver<PlayerEvent>>,
}

impl FakePlayer {
    pub fn new() -> (Self, PlayerProbe, mpsc::Sender<PlayerEvent>) {
        let (tx, rx) = mpsc::channel(32);
        let probe = PlayerProbe::default();
        let player = Self { probe: probe.clone(), volume: 0.5, events: Some(rx) };
        (player, probe, tx)
    }
}

impl Player for FakePlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
        if *self.probe.refuse_play.lock().unwrap() {
            return Err(PlayerError::Start {
                path: path.to_path_buf(),
                reason: "backend refused".into(),
            });
        }
        self.probe.plays.lock().unwrap().push(path.to_path_buf());
        *self.probe.status.lock().unwrap() = PlaybackStatus::Playing;
        *self.probe.position.lock().unwrap() = Some(Duration::ZERO);
        Ok(())
    }

    fn pause(&mut self) {
        *self.probe.status.lock().unwrap() = PlaybackStatus::Paused;
    }

    fn resume(&mut self) {
        *self.probe.status.lock().unwrap() = PlaybackStatus::Playing;
    }

    fn toggle(&mut self) -> Result<(), PlayerError> {
        let mut status = self.probe.status.lock().unwrap();
        *status = match *status {
            PlaybackStatus::Playing => PlaybackStatus::Paused,
            PlaybackStatus::Paused => PlaybackStatus::Playing,
            PlaybackStatus::Stopped => PlaybackStatus::Stopped,
        };
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        *self.probe.stops.lock().unwrap() += 1;
        *self.probe.status.lock().unwrap() = PlaybackStatus::Stopped;
        *self.probe.position.lock().unwrap() = None;
        Ok(())
    }

    fn seek(&mut self, delta_secs: i64) {
        self.probe.seeks.lock().unwrap().push(delta_secs);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn position(&self) -> Option<Duration> {
        *self.probe.position.lock().unwrap()
    }

    fn duration(&self) -> Option<Duration> {
        *self.probe.duration.lock().unwrap()
    }

    fn status(&self) -> PlaybackStatus {
        *self.probe.status.lock().unwrap()
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<PlayerEvent>> {
        self.events.take()
    }
}

// ── Scanner ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SearchSession {
    pub query: SearchQuery,
    pub tx: mpsc::Sender<ScanResult>,
    pub cancel: CancellationToken,
}

#[derive(Clone)]
pub struct LibraryScanSession {
    pub roots: Vec<PathBuf>,
    pub tx: mpsc::Sender<LibraryProgress>,
    pub cancel: CancellationToken,
}

#[derive(Clone, Default)]
pub struct ScannerProbe {
    library: Arc<Mutex<Vec<Track>>>,
    searches: Arc<Mutex<Vec<SearchSession>>>,
    scans: Arc<Mutex<Vec<LibraryScanSession>>>,
}

impl ScannerProbe {
    pub fn set_library(&self, tracks: Vec<Track>) {
        *self.library.lock().unwrap() = tracks;
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn search(&self, i: usize) -> SearchSession {
        self.searches.lock().unwrap()[i].clone()
    }

    pub fn last_search(&self) -> SearchSession {
        self.searches.lock().unwrap().last().cloned().expect("a search session")
    }

    pub fn scan_count(&self) -> usize {
        self.scans.lock().unwrap().len()
    }

    pub fn scan(&self, i: usize) -> LibraryScanSession {
        self.scans.lock().unwrap()[i].clone()
    }

    pub fn last_scan(&self) -> LibraryScanSession {
        self.scans.lock().unwrap().last().cloned().expect("a library scan session")
    }
}

pub struct FakeScanner {
    probe: ScannerProbe,
}

impl FakeScanner {
    pub fn new(probe: ScannerProbe) -> Self {
        Self { probe }
    }
}

impl Scanner for FakeScanner {
    fn search(&self, query: &SearchQuery) -> ScanHandle {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        self.probe.searches.lock().unwrap().push(SearchSession {
            query: query.clone(),
            tx,
            cancel: cancel.clone(),
        });
        ScanHandle { results: rx, cancel }
    }

    fn scan_library(&self, roots: &[PathBuf]) -> LibraryScanHandle {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        self.probe.scans.lock().unwrap().push(LibraryScanSession {
            roots: roots.to_vec(),
            tx,
            cancel: cancel.clone(),
        });
        LibraryScanHandle { progress: rx, cancel }
    }

    fn library_tracks(&self) -> Vec<Track> {
        self.probe.library.lock().unwrap().clone()
    }
}

// ── Recommender ───────────────────────────────────────────────────────────────

pub struct FakeRecommender {
    enabled: AtomicBool,
    seed: Mutex<Option<String>>,
    recents: Mutex<Vec<String>>,
    requests: Mutex<Vec<(String, Vec<String>)>>,
    tracks: Mutex<Vec<Track>>,
    failure: Mutex<Option<String>>,
}

impl FakeRecommender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(true),
            seed: Mutex::new(None),
            recents: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        })
    }

    pub fn respond_with(&self, tracks: Vec<Track>) {
        *self.tracks.lock().unwrap() = tracks;
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn requests(&self) -> Vec<(String, Vec<String>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn recents(&self) -> Vec<String> {
        self.recents.lock().unwrap().clone()
    }
}

impl Recommender for FakeRecommender {
    fn fill(&self, seed: &str, favorites: &[String]) -> Result<RecommendFill, RecommendError> {
        self.requests.lock().unwrap().push((seed.to_string(), favorites.to_vec()));
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(RecommendError::Failed(message));
        }
        Ok(RecommendFill { tracks: self.tracks.lock().unwrap().clone(), note: None })
    }

    fn set_seed(&self, seed: &str) {
        *self.seed.lock().unwrap() = Some(seed.to_string());
    }

    fn current_seed(&self) -> Option<String> {
        self.seed.lock().unwrap().clone()
    }

    fn add_recent(&self, artist: &str) {
        self.recents.lock().unwrap().push(artist.to_string());
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

// ── Scrobble sink ─────────────────────────────────────────────────────────────

pub struct FakeScrobbleSink {
    submitted: Mutex<Vec<ScrobbleRecord>>,
    queued: Mutex<Vec<ScrobbleRecord>>,
    failure: Mutex<Option<String>>,
    retries: Mutex<Option<mpsc::Receiver<ScrobbleRecord>>>,
    pub retry_tx: mpsc::Sender<ScrobbleRecord>,
}

impl FakeScrobbleSink {
    pub fn new() -> Arc<Self> {
        let (retry_tx, retry_rx) = mpsc::channel(16);
        Arc::new(Self {
            submitted: Mutex::new(Vec::new()),
            queued: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            retries: Mutex::new(Some(retry_rx)),
            retry_tx,
        })
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn submitted(&self) -> Vec<ScrobbleRecord> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn queued_retries(&self) -> Vec<ScrobbleRecord> {
        self.queued.lock().unwrap().clone()
    }
}

impl ScrobbleSink for FakeScrobbleSink {
    fn submit(&self, record: &ScrobbleRecord) -> Result<(), ScrobbleError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ScrobbleError::Failed(message));
        }
        self.submitted.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn queue_retry(&self, record: &ScrobbleRecord) {
        self.queued.lock().unwrap().push(record.clone());
    }

    fn take_retries(&self) -> Option<mpsc::Receiver<ScrobbleRecord>> {
        self.retries.lock().unwrap().take()
    }
}

// ── Session store ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    nav: Mutex<Option<NavSnapshot>>,
    queue: Mutex<Option<QueueSnapshot>>,
    playlists: Mutex<Vec<Playlist>>,
    queue_saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn nav(&self) -> Option<NavSnapshot> {
        self.nav.lock().unwrap().clone()
    }

    pub fn queue(&self) -> Option<QueueSnapshot> {
        self.queue.lock().unwrap().clone()
    }

    pub fn playlists(&self) -> Vec<Playlist> {
        self.playlists.lock().unwrap().clone()
    }

    pub fn queue_save_count(&self) -> usize {
        *self.queue_saves.lock().unwrap()
    }

    pub fn seed_nav(&self, nav: NavSnapshot) {
        *self.nav.lock().unwrap() = Some(nav);
    }

    pub fn seed_queue(&self, queue: QueueSnapshot) {
        *self.queue.lock().unwrap() = Some(queue);
    }

    pub fn seed_playlists(&self, playlists: Vec<Playlist>) {
        *self.playlists.lock().unwrap() = playlists;
    }
}

impl SessionStore for MemoryStore {
    fn save_navigation(&self, nav: &NavSnapshot) -> Result<(), StoreError> {
        *self.nav.lock().unwrap() = Some(nav.clone());
        Ok(())
    }

    fn save_queue(&self, queue: &QueueSnapshot) -> Result<(), StoreError> {
        *self.queue_saves.lock().unwrap() += 1;
        *self.queue.lock().unwrap() = Some(queue.clone());
        Ok(())
    }

    fn save_playlists(&self, playlists: &[Playlist]) -> Result<(), StoreError> {
        *self.playlists.lock().unwrap() = playlists.to_vec();
        Ok(())
    }

    fn load_navigation(&self) -> Result<Option<NavSnapshot>, StoreError> {
        Ok(self.nav.lock().unwrap().clone())
    }

    fn load_queue(&self) -> Result<Option<QueueSnapshot>, StoreError> {
        Ok(self.queue.lock().unwrap().clone())
    }

    fn load_playlists(&self) -> Result<Vec<Playlist>, StoreError> {
        Ok(self.playlists.lock().unwrap().clone())
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

pub struct Harness {
    pub player: PlayerProbe,
    pub player_events: mpsc::Sender<PlayerEvent>,
    pub scanner: ScannerProbe,
    pub recommender: Arc<FakeRecommender>,
    pub scrobbler: Arc<FakeScrobbleSink>,
    pub store: Arc<MemoryStore>,
    pub downloads: mpsc::Sender<DownloadEvent>,
    pub remote: mpsc::Sender<RemoteCommand>,
}

/// A config pointing at fixed test paths, radio on, scrobbling off.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.library.music_dirs = vec![PathBuf::from("/m/library")];
    config
}

pub fn harness() -> (App, Harness) {
    harness_with(test_config())
}

pub fn harness_with(config: Config) -> (App, Harness) {
    let (player, player_probe, player_events) = FakePlayer::new();
    let scanner_probe = ScannerProbe::default();
    let recommender = FakeRecommender::new();
    let scrobbler = FakeScrobbleSink::new();
    let store = Arc::new(MemoryStore::default());
    let (download_tx, download_rx) = mpsc::channel(16);
    let (remote_tx, remote_rx) = mpsc::channel(16);

    let app = App::new(
        config,
        Collaborators {
            player: Box::new(player),
            scanner: Box::new(FakeScanner::new(scanner_probe.clone())),
            recommender: Some(recommender.clone() as Arc<dyn Recommender>),
            scrobbler: Some(scrobbler.clone() as Arc<dyn ScrobbleSink>),
            store: store.clone() as Arc<dyn SessionStore>,
            downloads: Some(download_rx),
            remote: Some(remote_rx),
        },
    );

    let harness = Harness {
        player: player_probe,
        player_events,
        scanner: scanner_probe,
        recommender,
        scrobbler,
        store,
        downloads: download_tx,
        remote: remote_tx,
    };
    (app, harness)
}

// ── Builders and helpers ──────────────────────────────────────────────────────

pub fn track(artist: &str, title: &str, path: &str) -> Track {
    Track {
        path: PathBuf::from(path),
        title: title.to_string(),
        artist: artist.to_string(),
        album: String::new(),
        duration_secs: Some(200),
    }
}

pub fn numbered_tracks(n: usize) -> Vec<Track> {
    (0..n)
        .map(|i| track(&format!("Artist {i}"), &format!("Track {i}"), &format!("/m/t{i}.mp3")))
        .collect()
}

/// Load `n` tracks and make `index` current.
pub fn seed_queue(app: &mut App, n: usize, index: usize) {
    app.queue.add(numbered_tracks(n));
    app.queue.jump_to(index);
}

/// Mirror an active player into the loop state.
pub fn force_playing(app: &mut App, player: &PlayerProbe, position_secs: u64, duration_secs: u64) {
    player.set_status(PlaybackStatus::Playing);
    player.set_position(position_secs);
    player.set_duration(duration_secs);
    app.refresh_playback();
}

pub fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn press(c: char) -> Message {
    key(KeyCode::Char(c))
}

// ── Command inspection ────────────────────────────────────────────────────────

pub fn count_kind(commands: &[Command], kind: &str) -> usize {
    commands.iter().filter(|c| c.kind() == kind).count()
}

pub fn has_kind(commands: &[Command], kind: &str) -> bool {
    count_kind(commands, kind) > 0
}

pub fn skip_timer_version(commands: &[Command]) -> Option<u64> {
    commands.iter().find_map(|c| match c {
        Command::Delay { message: Message::SkipTimer { version }, .. } => Some(*version),
        _ => None,
    })
}

pub fn prefix_timeout_epoch(commands: &[Command]) -> Option<u64> {
    commands.iter().find_map(|c| match c {
        Command::Delay { message: Message::PrefixTimeout { epoch }, .. } => Some(*epoch),
        _ => None,
    })
}

pub fn watch_search_epoch(commands: &[Command]) -> Option<u64> {
    commands.iter().find_map(|c| match c {
        Command::WatchSearch { epoch, .. } => Some(*epoch),
        _ => None,
    })
}

pub fn watch_library_epoch(commands: &[Command]) -> Option<u64> {
    commands.iter().find_map(|c| match c {
        Command::WatchLibrary { epoch, .. } => Some(*epoch),
        _ => None,
    })
}
