//! The dispatcher.
//!
//! `update` is the only place [`App`] is mutated: one message in, state
//! changed, commands out. Handlers are grouped the way messages arrive --
//! keys, player events, timers, scan sessions, feeds -- with the action
//! interpreter at the bottom.
//!
//! ## Ordering rules baked in here
//!
//! - popups capture keys before the search input, which captures them
//!   before the router
//! - scan messages pass the bridge's admission check before touching any
//!   list, and are re-armed only through the bridge
//! - playback bookkeeping (scrobble, radio, tick) reacts to player events
//!   and ticks only, never to the key that caused them

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use crossterm::event::{Event, KeyCode, KeyEvent};
use tracing::{debug, info, warn};
use tui_input::backend::crossterm::EventHandler;

use fermata_model::boundary::RecommendFill;
use fermata_model::error::{RecommendError, ScrobbleError};
use fermata_model::playback::{
    DownloadStatus, PlaybackStatus, PlayerEvent, RemoteCommand, RepeatMode,
};
use fermata_model::scan::ScanReport;
use fermata_model::session::View;
use fermata_model::track::{Playlist, SearchQuery, Track};

use crate::action::{Action, AlbumAction, ConfirmKind, Focus, TextInputKind};
use crate::command::Command;
use crate::input::{RouteContext, PREFIX_TIMEOUT};
use crate::message::{Feed, Message};
use crate::policy::PLAYBACK_TICK;
use crate::popup::Popup;
use crate::state::{audio_files_in, is_audio, App};
use crate::transition::{SkipOutcome, SKIP_DEBOUNCE};

/// Apply one message to the state, returning the commands to spawn.
pub fn update(app: &mut App, message: Message) -> Vec<Command> {
    match message {
        Message::Key(key) => handle_key(app, key),
        Message::Player(event) => handle_player_event(app, event),
        Message::Tick => handle_tick(app),
        Message::SkipTimer { version } => handle_skip_timer(app, version),
        Message::PrefixTimeout { epoch } => match app.router.resolve_timeout(epoch) {
            Some(action) => apply_action(app, action),
            None => Vec::new(),
        },

        Message::Search { epoch, batch } => {
            if !app.bridge.admit_search(epoch) {
                debug!("dropping batch from stale search session {}", epoch);
                return Vec::new();
            }
            app.search.results.extend(batch.items);
            app.clamp_cursors();
            app.bridge.rearm_search(epoch).into_iter().collect()
        }
        Message::SearchClosed { epoch } => {
            if app.bridge.finish_search(epoch) {
                debug!("search complete: {} results", app.search.results.len());
            }
            Vec::new()
        }

        Message::Library { epoch, progress } => {
            if !app.bridge.admit_library(epoch) {
                debug!("dropping progress from stale library session {}", epoch);
                return Vec::new();
            }
            // A progress step carrying an error ends the session, whatever
            // its phase claims.
            if let Some(err) = progress.error {
                warn!("library scan failed: {}", err);
                app.bridge.cancel_library();
                app.popups.open(Popup::Error { message: format!("Library scan: {err}") });
                return Vec::new();
            }
            app.bridge.record_library_progress(progress);
            app.bridge.rearm_library(epoch).into_iter().collect()
        }
        Message::LibraryClosed { epoch } => {
            let Some((last, elapsed)) = app.bridge.finish_library(epoch) else {
                return Vec::new();
            };
            app.library = app.scanner.library_tracks();
            app.clamp_cursors();
            let report = ScanReport::from_progress(&last, elapsed);
            info!(
                "library scan done: +{} ~{} -{} in {}s",
                report.added, report.updated, report.removed, report.elapsed_secs
            );
            app.popups.open(Popup::ScanReport(report));
            Vec::new()
        }

        Message::Download(event) => {
            match &event.status {
                DownloadStatus::Complete { path } => info!("download complete: {}", path.display()),
                DownloadStatus::Failed(reason) => warn!("download failed: {}", reason),
                _ => {}
            }
            app.record_download(event);
            app.feeds.rearm(Feed::Downloads).into_iter().collect()
        }

        Message::Radio(outcome) => handle_radio_fill(app, outcome),

        Message::ScrobbleDone { record, outcome } => {
            match outcome {
                Ok(()) => debug!("scrobbled {} - {}", record.artist, record.title),
                Err(ScrobbleError::NotAuthenticated) => {
                    warn!("scrobble dropped: not authenticated");
                }
                Err(e) => {
                    warn!("scrobble failed, queueing retry: {}", e);
                    if let Some(sink) = &app.scrobbler {
                        sink.queue_retry(&record);
                    }
                }
            }
            Vec::new()
        }
        Message::ScrobbleRetry(record) => {
            let mut commands = Vec::new();
            if let Some(sink) = &app.scrobbler {
                if app.config.scrobble.authenticated() {
                    debug!("retrying scrobble {} - {}", record.artist, record.title);
                    commands.push(Command::Scrobble { sink: Arc::clone(sink), record });
                }
            }
            commands.extend(app.feeds.rearm(Feed::ScrobbleRetries));
            commands
        }

        Message::Remote(cmd) => {
            debug!("remote command: {:?}", cmd);
            let mut commands = match cmd {
                RemoteCommand::PlayPause => apply_action(app, Action::TogglePause),
                RemoteCommand::Next => apply_action(app, Action::Next),
                RemoteCommand::Previous => apply_action(app, Action::Previous),
                RemoteCommand::Stop => apply_action(app, Action::Stop),
                RemoteCommand::SeekBy(delta) => {
                    app.player.seek(delta);
                    app.refresh_playback();
                    Vec::new()
                }
            };
            commands.extend(app.feeds.rearm(Feed::Remote));
            commands
        }

        Message::FeedClosed(feed) => {
            info!("{} feed closed", feed.label());
            app.feeds.close(feed);
            Vec::new()
        }
        Message::Noop => Vec::new(),
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Command> {
    // Popups capture everything while open.
    if !app.popups.is_empty() {
        let actions = app.popups.handle_key(key);
        return apply_all(app, actions);
    }
    // The search input owns keystrokes while active.
    if app.search.active {
        return handle_search_key(app, key);
    }

    let ctx = RouteContext { view: app.nav.view, focus: app.nav.focus };
    let routed = app.router.route(key, ctx);
    let mut commands = apply_all(app, routed.actions);
    if let Some(epoch) = routed.timeout {
        commands.push(Command::Delay {
            after: PREFIX_TIMEOUT,
            message: Message::PrefixTimeout { epoch },
        });
    }
    commands
}

fn handle_search_key(app: &mut App, key: KeyEvent) -> Vec<Command> {
    match key.code {
        KeyCode::Esc => {
            app.search.dismiss();
            app.bridge.cancel_search();
            app.clamp_cursors();
            Vec::new()
        }
        KeyCode::Enter => {
            app.search.commit();
            Vec::new()
        }
        _ => {
            let before = app.search.text().to_string();
            app.search.input.handle_event(&Event::Key(key));
            if app.search.text() == before {
                return Vec::new();
            }
            restart_search(app)
        }
    }
}

/// Every edit of the search text cancels the running session and starts a
/// fresh one; an emptied input just cancels.
fn restart_search(app: &mut App) -> Vec<Command> {
    app.search.results.clear();
    app.nav.library_cursor = 0;
    let text = app.search.text().trim().to_string();
    if text.is_empty() {
        app.bridge.cancel_search();
        return Vec::new();
    }
    let query = match app.nav.view {
        View::FileBrowser => SearchQuery::directory(text, app.browser.dir.clone()),
        _ => SearchQuery::library(text),
    };
    let handle = app.scanner.search(&query);
    vec![app.bridge.start_search(handle)]
}

// ── Player events ─────────────────────────────────────────────────────────────

fn handle_player_event(app: &mut App, event: PlayerEvent) -> Vec<Command> {
    let mut commands = Vec::new();
    match event {
        PlayerEvent::StateChanged(status) => {
            app.refresh_playback();
            match status {
                PlaybackStatus::Playing => {
                    if app.policy.arm_tick(true) {
                        commands.push(tick_delay());
                    }
                }
                PlaybackStatus::Paused => {}
                PlaybackStatus::Stopped => {
                    if app.playback.expected_stop {
                        app.playback.expected_stop = false;
                        app.policy.track_cleared();
                    } else {
                        commands.extend(track_finished(app));
                    }
                }
            }
        }
        PlayerEvent::TrackChanged { index, track } => {
            commands.extend(adopt_track_change(app, index, track));
        }
        PlayerEvent::Error(message) => {
            warn!("player error: {}", message);
            app.popups.open(Popup::Error { message });
            app.refresh_playback();
        }
        PlayerEvent::QueueChanged => {
            debug!("backend queue changed");
        }
    }
    commands.extend(app.feeds.rearm(Feed::Player));
    commands
}

/// The current track ran out. Move to whatever the queue says plays next,
/// or come to rest at the tail.
fn track_finished(app: &mut App) -> Vec<Command> {
    app.policy.track_cleared();
    let next = app.queue.advance().map(|t| t.path.clone());
    match next {
        Some(path) => {
            info!("track finished, advancing to {}", path.display());
            start_playback(app, path)
        }
        None => {
            info!("queue finished");
            app.playback.ran_out = true;
            vec![app.save_queue_command()]
        }
    }
}

/// The backend reports a (possibly self-initiated) track change; adopt it
/// as the single source of started-playing truth.
fn adopt_track_change(app: &mut App, index: usize, track: Track) -> Vec<Command> {
    let mut commands = Vec::new();
    if app.queue.current_index() != Some(index) && app.queue.jump_to(index).is_none() {
        warn!("backend reported track {} outside the queue", index);
    }
    if let Some(current) = app.queue.current_index() {
        app.nav.queue_cursor = current;
    }
    info!("now playing: {}", track.display());
    app.policy.track_started(&track, Utc::now().timestamp());
    if let Some(recommender) = &app.recommender {
        if !track.artist.is_empty() {
            recommender.add_recent(&track.artist);
        }
    }
    app.refresh_playback();
    if app.policy.arm_tick(app.playback.status == PlaybackStatus::Playing) {
        commands.push(tick_delay());
    }

    // Starting on the queue's last track refills radio eagerly.
    let at_tail = app
        .queue
        .current_index()
        .map(|i| i + 1 == app.queue.len())
        .unwrap_or(false);
    if at_tail {
        if let Some(cmd) = radio_fill_command(app) {
            if app.policy.radio_tail_start() {
                commands.push(cmd);
            }
        }
    }

    commands.push(app.save_queue_command());
    commands
}

// ── Timers ────────────────────────────────────────────────────────────────────

fn handle_tick(app: &mut App) -> Vec<Command> {
    app.policy.tick_received();
    app.refresh_playback();
    if app.playback.status != PlaybackStatus::Playing {
        // Chain ends here; resuming re-arms it.
        return Vec::new();
    }

    let mut commands = Vec::new();
    let position = app.playback.position_secs();
    let duration = app.playback.duration_secs();

    let can_scrobble = app.scrobbler.is_some() && app.config.scrobble.authenticated();
    if let Some(record) = app.policy.scrobble_due(position, can_scrobble) {
        if let Some(sink) = &app.scrobbler {
            info!("scrobbling {} - {}", record.artist, record.title);
            commands.push(Command::Scrobble { sink: Arc::clone(sink), record });
        }
    }

    let radio_mode = app.queue.repeat() == RepeatMode::Radio;
    let has_next = app.queue.has_next();
    if let Some(cmd) = radio_fill_command(app) {
        if app.policy.radio_due(position, duration, radio_mode, has_next) {
            info!("radio: last track nearly over, requesting fill");
            commands.push(cmd);
        }
    }

    if app.policy.arm_tick(true) {
        commands.push(tick_delay());
    }
    commands
}

fn handle_skip_timer(app: &mut App, version: u64) -> Vec<Command> {
    let Some(index) = app.skip.on_timeout(version) else {
        return Vec::new();
    };
    let Some(path) = app.queue.track_at(index).map(|t| t.path.clone()) else {
        return Vec::new();
    };
    app.queue.jump_to(index);
    debug!("skip settled on queue index {}", index);
    start_playback(app, path)
}

fn tick_delay() -> Command {
    Command::Delay { after: PLAYBACK_TICK, message: Message::Tick }
}

// ── Radio ─────────────────────────────────────────────────────────────────────

/// Build a fill command if radio is usable right now: configured on, a
/// recommender attached and willing, and something to seed from.
fn radio_fill_command(app: &App) -> Option<Command> {
    if !app.config.radio.enabled {
        return None;
    }
    let recommender = app.recommender.as_ref()?;
    if !recommender.enabled() {
        return None;
    }
    let seed = recommender.current_seed().or_else(|| {
        app.queue
            .current()
            .map(|t| t.artist.clone())
            .filter(|artist| !artist.is_empty())
    })?;
    Some(Command::RadioFill {
        recommender: Arc::clone(recommender),
        seed,
        favorites: app.favorite_artists(),
    })
}

fn handle_radio_fill(app: &mut App, outcome: Result<RecommendFill, RecommendError>) -> Vec<Command> {
    match outcome {
        Ok(mut fill) => {
            fill.tracks.truncate(app.config.radio.fill_size);
            if fill.tracks.is_empty() {
                debug!("radio fill returned nothing");
                return Vec::new();
            }
            let count = fill.tracks.len();
            app.queue.add(fill.tracks);
            if let Some(note) = fill.note {
                debug!("radio fill: {}", note);
            }
            info!("radio fill added {} tracks", count);

            let mut commands = vec![app.save_queue_command()];
            // A fill that lands after the queue already ran out resumes
            // playback, but only in radio mode and never over a user stop.
            if app.playback.ran_out && app.queue.repeat() == RepeatMode::Radio {
                let next = app.queue.advance().map(|t| t.path.clone());
                if let Some(path) = next {
                    commands.extend(start_playback(app, path));
                }
            }
            commands
        }
        Err(RecommendError::Disabled) => {
            debug!("radio fill skipped: recommender disabled");
            Vec::new()
        }
        Err(e) => {
            warn!("radio fill failed: {}", e);
            app.popups.open(Popup::Error { message: format!("Radio: {e}") });
            Vec::new()
        }
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

fn apply_all(app: &mut App, actions: Vec<Action>) -> Vec<Command> {
    let mut commands = Vec::new();
    for action in actions {
        commands.extend(apply_action(app, action));
    }
    commands
}

fn apply_action(app: &mut App, action: Action) -> Vec<Command> {
    match action {
        // ── Transport ─────────────────────────────────────────────────────────
        Action::TogglePause => {
            if app.queue.current().is_none() {
                return Vec::new();
            }
            if let Err(e) = app.player.toggle() {
                warn!("toggle failed: {}", e);
                app.popups.open(Popup::Error { message: e.to_string() });
                return Vec::new();
            }
            app.refresh_playback();
            let mut commands = Vec::new();
            if app.policy.arm_tick(app.playback.status == PlaybackStatus::Playing) {
                commands.push(tick_delay());
            }
            commands
        }
        Action::Stop => {
            app.playback.expected_stop = true;
            app.playback.ran_out = false;
            app.skip.invalidate();
            if let Err(e) = app.player.stop() {
                warn!("stop failed: {}", e);
            }
            app.policy.track_cleared();
            app.refresh_playback();
            Vec::new()
        }
        Action::Next => request_skip(app, true),
        Action::Previous => request_skip(app, false),
        Action::JumpToFirst => {
            if app.queue.jump_to(0).is_none() {
                return Vec::new();
            }
            schedule_transition(app, 0)
        }
        Action::JumpToLast => {
            let Some(last) = app.queue.len().checked_sub(1) else {
                return Vec::new();
            };
            if app.queue.jump_to(last).is_none() {
                return Vec::new();
            }
            schedule_transition(app, last)
        }
        Action::SeekForward => {
            app.player.seek(app.config.playback.seek_step_secs as i64);
            app.refresh_playback();
            Vec::new()
        }
        Action::SeekBackward => {
            app.player.seek(-(app.config.playback.seek_step_secs as i64));
            app.refresh_playback();
            Vec::new()
        }
        Action::VolumeUp => adjust_volume(app, app.config.playback.volume_step),
        Action::VolumeDown => adjust_volume(app, -app.config.playback.volume_step),
        Action::CycleRepeat => {
            let mode = app.queue.repeat().cycle();
            app.queue.set_repeat(mode);
            info!("repeat: {}", mode.label());
            vec![app.save_queue_command()]
        }
        Action::ToggleShuffle => {
            let on = !app.queue.shuffle();
            app.queue.set_shuffle(on);
            info!("shuffle: {}", if on { "on" } else { "off" });
            vec![app.save_queue_command()]
        }
        Action::ToggleRadio => {
            let mode = if app.queue.repeat() == RepeatMode::Radio {
                RepeatMode::Off
            } else {
                RepeatMode::Radio
            };
            app.queue.set_repeat(mode);
            info!("repeat: {}", mode.label());
            vec![app.save_queue_command()]
        }
        Action::Undo => {
            if !app.queue.undo() {
                return Vec::new();
            }
            app.clamp_cursors();
            vec![app.save_queue_command()]
        }
        Action::Redo => {
            if !app.queue.redo() {
                return Vec::new();
            }
            app.clamp_cursors();
            vec![app.save_queue_command()]
        }

        // ── Navigation ────────────────────────────────────────────────────────
        Action::SwitchView(view) => {
            app.nav.view = view;
            if view == View::FileBrowser {
                if let Err(e) = app.browser.refresh() {
                    debug!("browser listing failed: {}", e);
                }
            }
            app.clamp_cursors();
            vec![app.save_nav_command()]
        }
        Action::FocusToggle => {
            app.nav.focus = match app.nav.focus {
                Focus::List => Focus::Queue,
                Focus::Queue => Focus::List,
            };
            if app.nav.focus == Focus::Queue {
                app.nav.queue_visible = true;
            }
            vec![app.save_nav_command()]
        }
        Action::ToggleQueuePanel => {
            app.nav.queue_visible = !app.nav.queue_visible;
            if !app.nav.queue_visible && app.nav.focus == Focus::Queue {
                app.nav.focus = Focus::List;
            }
            vec![app.save_nav_command()]
        }
        Action::CursorUp => {
            app.move_cursor(-1);
            vec![app.save_nav_command()]
        }
        Action::CursorDown => {
            app.move_cursor(1);
            vec![app.save_nav_command()]
        }
        Action::CursorHome => {
            app.cursor_home();
            vec![app.save_nav_command()]
        }
        Action::CursorEnd => {
            app.cursor_end();
            vec![app.save_nav_command()]
        }
        Action::EnterSelection => enter_selection(app),
        Action::AppendSelection => append_selection(app),
        Action::BrowserUp => match app.browser.ascend() {
            Ok(true) => {
                app.nav.browser_cursor = 0;
                vec![app.save_nav_command()]
            }
            Ok(false) => Vec::new(),
            Err(e) => {
                warn!("browser ascend failed: {}", e);
                Vec::new()
            }
        },

        // ── Prefix sequences ──────────────────────────────────────────────────
        Action::ToggleFavorite => {
            if let Some(track) = app.selected_track() {
                let now = app.toggle_favorite(&track);
                info!(
                    "favorite {}: {}",
                    if now { "added" } else { "removed" },
                    track.display()
                );
            }
            Vec::new()
        }
        Action::SeedRadioFromSelection => {
            if let (Some(track), Some(recommender)) = (app.selected_track(), &app.recommender) {
                if !track.artist.is_empty() {
                    recommender.set_seed(&track.artist);
                    info!("radio seed: {}", track.artist);
                }
            }
            Vec::new()
        }

        // ── Search ────────────────────────────────────────────────────────────
        Action::OpenSearch => {
            app.bridge.cancel_search();
            app.search.begin();
            Vec::new()
        }

        // ── Popups / flows ────────────────────────────────────────────────────
        Action::ShowHelp => {
            app.popups.open(Popup::Help);
            Vec::new()
        }
        Action::OpenConfirmClearQueue => {
            if app.queue.is_empty() {
                return Vec::new();
            }
            app.popups.open(Popup::Confirm {
                kind: ConfirmKind::ClearQueue,
                prompt: "Clear the queue?".into(),
            });
            Vec::new()
        }
        Action::OpenSavePlaylist => {
            if app.queue.is_empty() {
                return Vec::new();
            }
            app.popups.open(Popup::text_input(TextInputKind::SavePlaylist, "Playlist name"));
            Vec::new()
        }
        Action::DeleteSelectedPlaylist => {
            if let Some(playlist) = app.selected_playlist() {
                let name = playlist.name.clone();
                app.popups.open(Popup::Confirm {
                    kind: ConfirmKind::DeletePlaylist(name.clone()),
                    prompt: format!("Delete playlist \"{name}\"?"),
                });
            }
            Vec::new()
        }
        Action::OpenLibrarySources => {
            app.popups.open(Popup::LibrarySources {
                dirs: app.config.library.music_dirs.clone(),
                cursor: 0,
            });
            Vec::new()
        }
        Action::OpenAlbumActions => {
            match app.selected_track().filter(|t| !t.album.is_empty()) {
                Some(track) => {
                    app.popups.open(Popup::AlbumActions { album: track.album, cursor: 0 });
                }
                None => debug!("album actions need a selection with an album tag"),
            }
            Vec::new()
        }
        Action::OpenDownloads => {
            app.popups.open(Popup::Downloads);
            Vec::new()
        }
        Action::OpenImport => {
            let path = app
                .selected_browser_entry()
                .map(|e| e.path.clone())
                .unwrap_or_else(|| app.browser.dir.clone());
            app.popups.open(Popup::Import { path });
            Vec::new()
        }
        Action::OpenRetag => {
            match app.selected_track().filter(|t| !t.album.is_empty()) {
                Some(track) => app.popups.open(Popup::Retag { album: track.album }),
                None => debug!("retag needs a selection with an album tag"),
            }
            Vec::new()
        }
        Action::StartLibraryScan => {
            let roots = app.config.library.music_dirs.clone();
            if roots.is_empty() {
                app.popups.open(Popup::Error {
                    message: "No music directories configured".into(),
                });
                return Vec::new();
            }
            let handle = app.scanner.scan_library(&roots);
            vec![app.bridge.start_library(handle)]
        }
        Action::ConfirmAccepted(kind) => confirm_accepted(app, kind),
        Action::TextSubmitted { kind, value } => text_submitted(app, kind, value),
        Action::AlbumActionChosen(choice) => album_action_chosen(app, choice),
        Action::ImportConfirmed => import_confirmed(app),
        Action::RetagApplied => {
            // Tag edits happen outside; our part is refreshing the index.
            info!("retag applied, rescanning library");
            apply_action(app, Action::StartLibraryScan)
        }

        // ── System ────────────────────────────────────────────────────────────
        Action::Quit => {
            app.quit();
            Vec::new()
        }
        Action::Noop => Vec::new(),
    }
}

// ── Action helpers ────────────────────────────────────────────────────────────

/// Begin playing `path` now: poisons any in-flight skip timer so it cannot
/// override this explicit choice.
fn start_playback(app: &mut App, path: PathBuf) -> Vec<Command> {
    app.skip.invalidate();
    app.playback.ran_out = false;
    if let Err(e) = app.player.play(&path) {
        warn!("play failed: {}", e);
        app.popups.open(Popup::Error { message: e.to_string() });
        return Vec::new();
    }
    app.playback.expected_stop = false;
    app.refresh_playback();
    let mut commands = vec![app.save_queue_command()];
    if app.policy.arm_tick(app.playback.status == PlaybackStatus::Playing) {
        commands.push(tick_delay());
    }
    commands
}

/// Manual next/previous. Moves the queue cursor immediately; while playback
/// is active the actual track start is debounced so rapid presses land a
/// single play. Stopped playback moves the cursor only.
fn request_skip(app: &mut App, forward: bool) -> Vec<Command> {
    let active = app.playback.status.is_active();
    let moved = if forward {
        // Repeat-one binds natural completion, not explicit skips.
        if app.queue.repeat() == RepeatMode::One {
            let next = app.queue.current_index().map(|i| i + 1).unwrap_or(0);
            app.queue.jump_to(next).map(|t| t.path.clone())
        } else {
            app.queue.advance().map(|t| t.path.clone())
        }
    } else {
        app.queue.previous().map(|t| t.path.clone())
    };
    if moved.is_none() {
        // Next off the tail stops playback; the index stays put. In radio
        // mode the stop counts as running out, so a pending fill may resume.
        if forward && active {
            app.playback.expected_stop = true;
            app.skip.invalidate();
            if let Err(e) = app.player.stop() {
                warn!("stop failed: {}", e);
            }
            app.policy.track_cleared();
            app.refresh_playback();
            app.playback.ran_out = app.queue.repeat() == RepeatMode::Radio;
        }
        return Vec::new();
    }
    let Some(index) = app.queue.current_index() else {
        return Vec::new();
    };
    schedule_transition(app, index)
}

/// The queue index already moved to `index`; while playback is active the
/// real start waits out the debounce window so rapid requests collapse into
/// the final one.
fn schedule_transition(app: &mut App, index: usize) -> Vec<Command> {
    app.nav.queue_cursor = index;
    match app.skip.request(index, app.playback.status.is_active()) {
        SkipOutcome::CursorOnly => vec![app.save_queue_command(), app.save_nav_command()],
        SkipOutcome::Scheduled { version } => vec![
            app.save_queue_command(),
            app.save_nav_command(),
            Command::Delay { after: SKIP_DEBOUNCE, message: Message::SkipTimer { version } },
        ],
    }
}

fn adjust_volume(app: &mut App, step: f32) -> Vec<Command> {
    let volume = (app.player.volume() + step).clamp(0.0, 1.0);
    app.player.set_volume(volume);
    app.refresh_playback();
    Vec::new()
}

fn enter_selection(app: &mut App) -> Vec<Command> {
    if app.nav.focus == Focus::Queue {
        let Some(path) = app.queue.jump_to(app.nav.queue_cursor).map(|t| t.path.clone()) else {
            return Vec::new();
        };
        return start_playback(app, path);
    }
    match app.nav.view {
        View::Library => {
            let Some(track) = app.library_list().get(app.nav.library_cursor).cloned() else {
                return Vec::new();
            };
            play_appended(app, vec![track])
        }
        View::Playlists => {
            let Some(playlist) = app.selected_playlist().cloned() else {
                return Vec::new();
            };
            if playlist.tracks.is_empty() {
                return Vec::new();
            }
            info!("playing playlist {}", playlist.name);
            app.queue.replace(playlist.tracks);
            let Some(path) = app.queue.jump_to(0).map(|t| t.path.clone()) else {
                return Vec::new();
            };
            start_playback(app, path)
        }
        View::FileBrowser => {
            let Some(entry) = app.selected_browser_entry().cloned() else {
                return Vec::new();
            };
            if entry.is_dir {
                if let Err(e) = app.browser.open(entry.path) {
                    warn!("browser open failed: {}", e);
                    return Vec::new();
                }
                app.nav.browser_cursor = 0;
                return vec![app.save_nav_command()];
            }
            play_appended(app, vec![Track::untagged(entry.path)])
        }
    }
}

/// Append the tracks and start on the first of them.
fn play_appended(app: &mut App, tracks: Vec<Track>) -> Vec<Command> {
    if tracks.is_empty() {
        return Vec::new();
    }
    let first = app.queue.len();
    app.queue.add(tracks);
    let Some(path) = app.queue.jump_to(first).map(|t| t.path.clone()) else {
        return Vec::new();
    };
    start_playback(app, path)
}

fn append_selection(app: &mut App) -> Vec<Command> {
    let tracks = match app.nav.view {
        View::Library => app
            .library_list()
            .get(app.nav.library_cursor)
            .cloned()
            .map(|t| vec![t])
            .unwrap_or_default(),
        View::Playlists => app
            .selected_playlist()
            .map(|p| p.tracks.clone())
            .unwrap_or_default(),
        View::FileBrowser => match app.selected_browser_entry().cloned() {
            Some(entry) if entry.is_dir => match audio_files_in(&entry.path) {
                Ok(files) => files.into_iter().map(Track::untagged).collect(),
                Err(e) => {
                    warn!("listing {} failed: {}", entry.path.display(), e);
                    Vec::new()
                }
            },
            Some(entry) => vec![Track::untagged(entry.path)],
            None => Vec::new(),
        },
    };
    if tracks.is_empty() {
        return Vec::new();
    }
    info!("queued {} tracks", tracks.len());
    app.queue.add(tracks);
    vec![app.save_queue_command()]
}

fn confirm_accepted(app: &mut App, kind: ConfirmKind) -> Vec<Command> {
    match kind {
        ConfirmKind::ClearQueue => {
            app.queue.clear();
            app.playback.expected_stop = true;
            app.playback.ran_out = false;
            app.skip.invalidate();
            if let Err(e) = app.player.stop() {
                warn!("stop failed: {}", e);
            }
            app.policy.track_cleared();
            app.refresh_playback();
            app.clamp_cursors();
            info!("queue cleared");
            vec![app.save_queue_command()]
        }
        ConfirmKind::DeletePlaylist(name) => {
            let before = app.playlists.len();
            app.playlists.retain(|p| p.name != name);
            if app.playlists.len() == before {
                return Vec::new();
            }
            info!("deleted playlist {}", name);
            app.clamp_cursors();
            vec![app.save_playlists_command()]
        }
    }
}

fn text_submitted(app: &mut App, kind: TextInputKind, value: String) -> Vec<Command> {
    match kind {
        TextInputKind::SavePlaylist => {
            let tracks = app.queue.tracks().to_vec();
            if tracks.is_empty() {
                return Vec::new();
            }
            match app.playlists.iter_mut().find(|p| p.name == value) {
                Some(existing) => existing.tracks = tracks,
                None => app.playlists.push(Playlist::new(value.clone(), tracks)),
            }
            info!("saved playlist {}", value);
            vec![app.save_playlists_command()]
        }
    }
}

/// The selection cannot have moved while the popup was open, so the album
/// is re-derived from it.
fn album_action_chosen(app: &mut App, choice: AlbumAction) -> Vec<Command> {
    let Some(track) = app.selected_track().filter(|t| !t.album.is_empty()) else {
        return Vec::new();
    };
    let tracks: Vec<Track> = app
        .library
        .iter()
        .filter(|t| t.album == track.album)
        .cloned()
        .collect();
    if tracks.is_empty() {
        return Vec::new();
    }
    match choice {
        AlbumAction::QueueAlbum => {
            info!("queued album {} ({} tracks)", track.album, tracks.len());
            app.queue.add(tracks);
            vec![app.save_queue_command()]
        }
        AlbumAction::PlayAlbum => {
            info!("playing album {}", track.album);
            app.queue.replace(tracks);
            let Some(path) = app.queue.jump_to(0).map(|t| t.path.clone()) else {
                return Vec::new();
            };
            start_playback(app, path)
        }
        AlbumAction::RetagAlbum => {
            app.popups.open(Popup::Retag { album: track.album });
            Vec::new()
        }
    }
}

fn import_confirmed(app: &mut App) -> Vec<Command> {
    let Some(dest_root) = app.config.library.music_dirs.first().cloned() else {
        app.popups.open(Popup::Error { message: "No music directories configured".into() });
        return Vec::new();
    };
    let source = app
        .selected_browser_entry()
        .map(|e| e.path.clone())
        .unwrap_or_else(|| app.browser.dir.clone());
    match import_into(&source, &dest_root) {
        Ok(0) => {
            debug!("nothing to import from {}", source.display());
            Vec::new()
        }
        Ok(count) => {
            info!("imported {} files into {}", count, dest_root.display());
            apply_action(app, Action::StartLibraryScan)
        }
        Err(e) => {
            app.popups.open(Popup::Error { message: format!("Import failed: {e}") });
            Vec::new()
        }
    }
}

/// Copy a file, or the audio files of a directory, into the library root.
fn import_into(source: &Path, dest_root: &Path) -> std::io::Result<usize> {
    std::fs::create_dir_all(dest_root)?;
    let files: Vec<PathBuf> = if source.is_dir() {
        audio_files_in(source)?
    } else if is_audio(source) {
        vec![source.to_path_buf()]
    } else {
        Vec::new()
    };
    let mut copied = 0;
    for file in &files {
        if let Some(name) = file.file_name() {
            std::fs::copy(file, dest_root.join(name))?;
            copied += 1;
        }
    }
    Ok(copied)
}
