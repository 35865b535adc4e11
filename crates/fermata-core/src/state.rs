//! Application state.
//!
//! [`App`] is the single-owner aggregate: every field is mutated only by
//! the dispatcher, on the loop task. Collaborators live here as trait
//! objects; commands get `Arc` clones of the shareable ones and never a
//! reference into the aggregate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use tui_input::Input;

use fermata_model::boundary::{Player, Recommender, Scanner, ScrobbleSink, SessionStore};
use fermata_model::config::Config;
use fermata_model::platform;
use fermata_model::playback::{DownloadEvent, PlaybackStatus, RemoteCommand};
use fermata_model::queue::PlayQueue;
use fermata_model::session::{NavSnapshot, View};
use fermata_model::track::{Playlist, Track};

use crate::action::Focus;
use crate::bridge::{Feeds, TaskBridge};
use crate::command::Command;
use crate::input::KeyRouter;
use crate::policy::PlaybackPolicy;
use crate::popup::PopupSet;
use crate::transition::SkipDebouncer;

// ── Navigation ────────────────────────────────────────────────────────────────

/// Cursor and pane state. One cursor per list, so switching views does not
/// lose the place in the previous one.
#[derive(Debug, Default)]
pub struct NavState {
    pub view: View,
    pub focus: Focus,
    pub library_cursor: usize,
    pub playlists_cursor: usize,
    pub browser_cursor: usize,
    pub queue_cursor: usize,
    pub queue_visible: bool,
}

impl NavState {
    /// The cursor that list-navigation keys move right now.
    pub fn focused_cursor_mut(&mut self) -> &mut usize {
        if self.focus == Focus::Queue {
            return &mut self.queue_cursor;
        }
        match self.view {
            View::Library     => &mut self.library_cursor,
            View::Playlists   => &mut self.playlists_cursor,
            View::FileBrowser => &mut self.browser_cursor,
        }
    }

    pub fn restore(&mut self, snap: &NavSnapshot) {
        self.view = snap.view;
        self.library_cursor = snap.library_cursor;
        self.playlists_cursor = snap.playlists_cursor;
        self.browser_cursor = snap.browser_cursor;
        self.queue_visible = snap.queue_visible;
    }
}

// ── File browser ──────────────────────────────────────────────────────────────

const AUDIO_EXTS: [&str; 8] = ["aac", "flac", "m4a", "mp3", "ogg", "opus", "wav", "wma"];

pub fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Audio files directly inside `dir`, sorted.
pub fn audio_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_audio(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// One directory of the filesystem view: subdirectories first, then audio
/// files, both alphabetical. Dotfiles are skipped.
#[derive(Debug)]
pub struct BrowserState {
    pub dir: PathBuf,
    pub entries: Vec<BrowserEntry>,
}

impl BrowserState {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, entries: Vec::new() }
    }

    pub fn refresh(&mut self) -> std::io::Result<()> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            } else if is_audio(&path) {
                files.push(path);
            }
        }
        dirs.sort();
        files.sort();
        self.entries = dirs
            .into_iter()
            .map(|path| BrowserEntry { path, is_dir: true })
            .chain(files.into_iter().map(|path| BrowserEntry { path, is_dir: false }))
            .collect();
        Ok(())
    }

    pub fn open(&mut self, dir: PathBuf) -> std::io::Result<()> {
        self.dir = dir;
        self.refresh()
    }

    /// Move to the parent directory. False at the filesystem root.
    pub fn ascend(&mut self) -> std::io::Result<bool> {
        let Some(parent) = self.dir.parent().map(Path::to_path_buf) else {
            return Ok(false);
        };
        self.dir = parent;
        self.refresh()?;
        Ok(true)
    }

    /// The listed audio files as untagged tracks, in display order.
    pub fn audio_tracks(&self) -> Vec<Track> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| Track::untagged(e.path.clone()))
            .collect()
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

/// The search overlay. While `active` the input owns keystrokes and every
/// edit restarts the scan session; Enter commits, keeping the results as
/// the Library view's list until a new search begins.
#[derive(Debug, Default)]
pub struct SearchState {
    pub active: bool,
    pub input: Input,
    pub results: Vec<Track>,
}

impl SearchState {
    pub fn begin(&mut self) {
        self.active = true;
        self.input = Input::default();
        self.results.clear();
    }

    pub fn dismiss(&mut self) {
        self.active = false;
        self.input = Input::default();
        self.results.clear();
    }

    pub fn commit(&mut self) {
        self.active = false;
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }
}

// ── Playback mirror ───────────────────────────────────────────────────────────

/// Last observed player state, refreshed on every player event and tick.
/// The render layer reads this; the dispatcher never queries the player
/// mid-draw.
#[derive(Debug, Default)]
pub struct PlaybackView {
    pub status: PlaybackStatus,
    pub position: Option<Duration>,
    pub duration: Option<Duration>,
    pub volume: f32,
    /// Set when the loop itself asked the player to stop, so the stopped
    /// event is not mistaken for the track running out.
    pub expected_stop: bool,
    /// Set when playback came to rest because the queue ran off its end.
    /// A radio fill landing afterwards may resume; a user stop may not.
    pub ran_out: bool,
}

impl PlaybackView {
    pub fn position_secs(&self) -> u64 {
        self.position.map(|d| d.as_secs()).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> Option<u64> {
        self.duration.map(|d| d.as_secs())
    }
}

// ── Collaborators ─────────────────────────────────────────────────────────────

/// Everything the embedding shell wires in before the loop starts.
pub struct Collaborators {
    pub player: Box<dyn Player>,
    pub scanner: Box<dyn Scanner>,
    pub recommender: Option<Arc<dyn Recommender>>,
    pub scrobbler: Option<Arc<dyn ScrobbleSink>>,
    pub store: Arc<dyn SessionStore>,
    pub downloads: Option<mpsc::Receiver<DownloadEvent>>,
    pub remote: Option<mpsc::Receiver<RemoteCommand>>,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub config: Config,
    pub queue: PlayQueue,
    pub nav: NavState,
    pub browser: BrowserState,
    pub search: SearchState,
    pub playback: PlaybackView,
    pub library: Vec<Track>,
    pub playlists: Vec<Playlist>,
    pub favorites: Vec<Track>,
    pub downloads: Vec<DownloadEvent>,
    pub popups: PopupSet,
    pub router: KeyRouter,
    pub skip: SkipDebouncer,
    pub bridge: TaskBridge,
    pub feeds: Feeds,
    pub policy: PlaybackPolicy,
    pub should_quit: bool,

    pub player: Box<dyn Player>,
    pub scanner: Box<dyn Scanner>,
    pub recommender: Option<Arc<dyn Recommender>>,
    pub scrobbler: Option<Arc<dyn ScrobbleSink>>,
    pub store: Arc<dyn SessionStore>,
}

impl App {
    pub fn new(config: Config, mut deps: Collaborators) -> Self {
        let player_events = deps.player.take_events();
        let retries = deps.scrobbler.as_ref().and_then(|s| s.take_retries());
        let feeds = Feeds::new(player_events, deps.downloads.take(), retries, deps.remote.take());

        Self {
            config,
            queue: PlayQueue::new(),
            nav: NavState::default(),
            browser: BrowserState::new(platform::default_music_dir()),
            search: SearchState::default(),
            playback: PlaybackView::default(),
            library: Vec::new(),
            playlists: Vec::new(),
            favorites: Vec::new(),
            downloads: Vec::new(),
            popups: PopupSet::new(),
            router: KeyRouter::new(),
            skip: SkipDebouncer::new(),
            bridge: TaskBridge::new(),
            feeds,
            policy: PlaybackPolicy::new(),
            should_quit: false,
            player: deps.player,
            scanner: deps.scanner,
            recommender: deps.recommender,
            scrobbler: deps.scrobbler,
            store: deps.store,
        }
    }

    /// Restore the previous session, load the library, and produce the
    /// initial watch commands. Called once before the loop starts.
    pub fn bootstrap(&mut self) -> Vec<Command> {
        let mut commands = self.feeds.initial_watches();

        match self.store.load_navigation() {
            Ok(Some(nav)) => {
                self.nav.restore(&nav);
                if let Some(dir) = nav.browser_dir.filter(|d| d.is_dir()) {
                    self.browser.dir = dir;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("navigation restore failed: {}", e),
        }
        match self.store.load_queue() {
            Ok(Some(snap)) => self.queue = PlayQueue::from_snapshot(snap),
            Ok(None) => {}
            Err(e) => warn!("queue restore failed: {}", e),
        }
        match self.store.load_playlists() {
            Ok(lists) => self.playlists = lists,
            Err(e) => warn!("playlist restore failed: {}", e),
        }

        self.library = self.scanner.library_tracks();
        if let Err(e) = self.browser.refresh() {
            debug!("browser listing failed: {}", e);
        }
        self.clamp_cursors();
        self.refresh_playback();

        let roots = self.config.library.music_dirs.clone();
        if !roots.is_empty() {
            let handle = self.scanner.scan_library(&roots);
            commands.push(self.bridge.start_library(handle));
        }
        commands
    }

    /// Stop background sessions and write the final snapshots inline; the
    /// runtime exits right after this.
    pub fn quit(&mut self) {
        self.should_quit = true;
        self.bridge.cancel_search();
        self.bridge.cancel_library();
        if let Err(e) = self.store.save_navigation(&self.nav_snapshot()) {
            warn!("final navigation snapshot failed: {}", e);
        }
        if let Err(e) = self.store.save_queue(&self.queue.snapshot()) {
            warn!("final queue snapshot failed: {}", e);
        }
        if let Err(e) = self.store.save_playlists(&self.playlists) {
            warn!("final playlist snapshot failed: {}", e);
        }
    }

    // ── Playback mirror ───────────────────────────────────────────────────────

    pub fn refresh_playback(&mut self) {
        self.playback.status = self.player.status();
        self.playback.position = self.player.position();
        self.playback.duration = self.player.duration();
        self.playback.volume = self.player.volume();
    }

    // ── Lists and selection ───────────────────────────────────────────────────

    /// What the Library view lists: committed search results when present,
    /// the full library otherwise.
    pub fn library_list(&self) -> &[Track] {
        if self.search.results.is_empty() {
            &self.library
        } else {
            &self.search.results
        }
    }

    pub fn focused_len(&self) -> usize {
        if self.nav.focus == Focus::Queue {
            return self.queue.len();
        }
        match self.nav.view {
            View::Library     => self.library_list().len(),
            View::Playlists   => self.playlists.len(),
            View::FileBrowser => self.browser.entries.len(),
        }
    }

    pub fn move_cursor(&mut self, delta: i64) {
        let len = self.focused_len();
        let cursor = self.nav.focused_cursor_mut();
        let moved = cursor.saturating_add_signed(delta as isize);
        *cursor = moved.min(len.saturating_sub(1));
    }

    pub fn cursor_home(&mut self) {
        *self.nav.focused_cursor_mut() = 0;
    }

    pub fn cursor_end(&mut self) {
        let len = self.focused_len();
        *self.nav.focused_cursor_mut() = len.saturating_sub(1);
    }

    /// Pull every cursor back inside its list after the lists changed.
    pub fn clamp_cursors(&mut self) {
        let lib = self.library_list().len();
        let lists = self.playlists.len();
        let files = self.browser.entries.len();
        let queue = self.queue.len();
        self.nav.library_cursor = self.nav.library_cursor.min(lib.saturating_sub(1));
        self.nav.playlists_cursor = self.nav.playlists_cursor.min(lists.saturating_sub(1));
        self.nav.browser_cursor = self.nav.browser_cursor.min(files.saturating_sub(1));
        self.nav.queue_cursor = self.nav.queue_cursor.min(queue.saturating_sub(1));
    }

    pub fn selected_playlist(&self) -> Option<&Playlist> {
        self.playlists.get(self.nav.playlists_cursor)
    }

    pub fn selected_browser_entry(&self) -> Option<&BrowserEntry> {
        self.browser.entries.get(self.nav.browser_cursor)
    }

    /// The track the current selection denotes, if any. Queue focus wins;
    /// otherwise the active view decides. Playlist rows are not tracks.
    pub fn selected_track(&self) -> Option<Track> {
        if self.nav.focus == Focus::Queue {
            return self.queue.track_at(self.nav.queue_cursor).cloned();
        }
        match self.nav.view {
            View::Library => self.library_list().get(self.nav.library_cursor).cloned(),
            View::Playlists => None,
            View::FileBrowser => self
                .selected_browser_entry()
                .filter(|e| !e.is_dir)
                .map(|e| Track::untagged(e.path.clone())),
        }
    }

    // ── Favorites ─────────────────────────────────────────────────────────────

    pub fn is_favorite(&self, path: &Path) -> bool {
        self.favorites.iter().any(|t| t.path == path)
    }

    /// Returns true when the track is a favorite after the toggle.
    pub fn toggle_favorite(&mut self, track: &Track) -> bool {
        if let Some(at) = self.favorites.iter().position(|t| t.path == track.path) {
            self.favorites.remove(at);
            false
        } else {
            self.favorites.push(track.clone());
            true
        }
    }

    /// Distinct favorite artists, for seeding radio fills.
    pub fn favorite_artists(&self) -> Vec<String> {
        let mut artists: Vec<String> = Vec::new();
        for track in &self.favorites {
            if !track.artist.is_empty() && !artists.contains(&track.artist) {
                artists.push(track.artist.clone());
            }
        }
        artists
    }

    // ── Downloads ─────────────────────────────────────────────────────────────

    pub fn record_download(&mut self, event: DownloadEvent) {
        match self.downloads.iter_mut().find(|d| d.id == event.id) {
            Some(slot) => *slot = event,
            None => self.downloads.push(event),
        }
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    pub fn nav_snapshot(&self) -> NavSnapshot {
        NavSnapshot {
            view: self.nav.view,
            library_cursor: self.nav.library_cursor,
            playlists_cursor: self.nav.playlists_cursor,
            browser_cursor: self.nav.browser_cursor,
            browser_dir: Some(self.browser.dir.clone()),
            queue_visible: self.nav.queue_visible,
        }
    }

    pub fn save_nav_command(&self) -> Command {
        Command::SaveNavigation { store: Arc::clone(&self.store), nav: self.nav_snapshot() }
    }

    pub fn save_queue_command(&self) -> Command {
        Command::SaveQueue { store: Arc::clone(&self.store), queue: self.queue.snapshot() }
    }

    pub fn save_playlists_command(&self) -> Command {
        Command::SavePlaylists { store: Arc::clone(&self.store), playlists: self.playlists.clone() }
    }
}
