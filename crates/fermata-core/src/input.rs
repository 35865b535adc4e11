//! Key routing.
//!
//! One router turns terminal keys into [`Action`]s through a fixed
//! delegation chain, so every binding has exactly one owner:
//!
//!   quit > view switch > focus / queue panel > help > prefix start >
//!   transport > focused-pane context > active-view context > navigator
//!
//! Prefix keys (`f`, `g`) start a pending two-key sequence. The next key
//! either completes a chord, or falls through to the prefix's single-key
//! default action, consumed either way; Esc cancels silently. A pending
//! sequence that sees no second key resolves to the same default when its
//! timeout fires. Both paths clear the sequence first, and timeouts carry
//! an epoch, so the default fires at most once per sequence no matter how
//! the timer races the second key.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use fermata_model::session::View;

use crate::action::{Action, Focus, Prefix};

/// How long a prefix key waits for its chord completion.
pub const PREFIX_TIMEOUT: Duration = Duration::from_millis(1000);

// ── Routing types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSequence {
    pub prefix: Prefix,
    pub epoch: u64,
}

/// What the router needs to know about the moment a key arrives.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext {
    pub view: View,
    pub focus: Focus,
}

/// The outcome of routing one key.
#[derive(Debug, Default)]
pub struct RouteResult {
    pub actions: Vec<Action>,
    /// Epoch of a newly started pending sequence; schedule its timeout.
    pub timeout: Option<u64>,
}

impl RouteResult {
    fn none() -> Self {
        Self::default()
    }

    fn act(action: Action) -> Self {
        Self { actions: vec![action], timeout: None }
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct KeyRouter {
    pending: Option<PendingSequence>,
    epoch: u64,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<Prefix> {
        self.pending.map(|p| p.prefix)
    }

    /// Drop the pending sequence without resolving it.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// The timeout for `epoch` fired. Resolves the sequence to its default
    /// action when it is still pending; stale epochs do nothing.
    pub fn resolve_timeout(&mut self, epoch: u64) -> Option<Action> {
        match self.pending {
            Some(p) if p.epoch == epoch => {
                self.pending = None;
                Some(p.prefix.default_action())
            }
            _ => None,
        }
    }

    /// Route one key through the delegation chain.
    pub fn route(&mut self, key: KeyEvent, ctx: RouteContext) -> RouteResult {
        if key.kind == KeyEventKind::Release {
            return RouteResult::none();
        }

        // A pending prefix claims the next key: complete a chord, or fall
        // through to the prefix's single-key default. Either way the key is
        // consumed and the sequence is over, so the scheduled timeout finds
        // a stale epoch.
        if let Some(pending) = self.pending.take() {
            return match key.code {
                KeyCode::Esc => RouteResult::none(),
                KeyCode::Char(c) => match pending.prefix.resolve(c) {
                    Some(action) => RouteResult::act(action),
                    None => RouteResult::act(pending.prefix.default_action()),
                },
                _ => RouteResult::act(pending.prefix.default_action()),
            };
        }

        self.chain(key, ctx)
    }

    fn begin_prefix(&mut self, prefix: Prefix) -> RouteResult {
        self.epoch += 1;
        self.pending = Some(PendingSequence { prefix, epoch: self.epoch });
        RouteResult { actions: Vec::new(), timeout: Some(self.epoch) }
    }

    fn chain(&mut self, key: KeyEvent, ctx: RouteContext) -> RouteResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => RouteResult::act(Action::Quit),
                KeyCode::Char('r') => RouteResult::act(Action::Redo),
                _ => RouteResult::none(),
            };
        }

        match key.code {
            KeyCode::Char('q') => return RouteResult::act(Action::Quit),

            KeyCode::Char('1') => return RouteResult::act(Action::SwitchView(View::Library)),
            KeyCode::Char('2') => return RouteResult::act(Action::SwitchView(View::Playlists)),
            KeyCode::Char('3') => return RouteResult::act(Action::SwitchView(View::FileBrowser)),
            KeyCode::Tab => return RouteResult::act(Action::FocusToggle),
            KeyCode::Char('e') => return RouteResult::act(Action::ToggleQueuePanel),
            KeyCode::Char('?') => return RouteResult::act(Action::ShowHelp),

            KeyCode::Char('f') => return self.begin_prefix(Prefix::Favorite),
            KeyCode::Char('g') => return self.begin_prefix(Prefix::Goto),

            KeyCode::Char(' ') => return RouteResult::act(Action::TogglePause),
            KeyCode::Char('n') => return RouteResult::act(Action::Next),
            KeyCode::Char('p') => return RouteResult::act(Action::Previous),
            KeyCode::Home => return RouteResult::act(Action::JumpToFirst),
            KeyCode::End => return RouteResult::act(Action::JumpToLast),
            KeyCode::Char('s') => return RouteResult::act(Action::Stop),
            KeyCode::Char('+') | KeyCode::Char('=') => return RouteResult::act(Action::VolumeUp),
            KeyCode::Char('-') => return RouteResult::act(Action::VolumeDown),
            KeyCode::Right => return RouteResult::act(Action::SeekForward),
            KeyCode::Left => return RouteResult::act(Action::SeekBackward),
            KeyCode::Char('r') => return RouteResult::act(Action::CycleRepeat),
            KeyCode::Char('y') => return RouteResult::act(Action::ToggleShuffle),
            KeyCode::Char('R') => return RouteResult::act(Action::ToggleRadio),
            KeyCode::Char('u') => return RouteResult::act(Action::Undo),
            KeyCode::Char('/') => return RouteResult::act(Action::OpenSearch),
            _ => {}
        }

        // Context actions: the focused queue pane outranks the active view.
        if ctx.focus == Focus::Queue {
            match key.code {
                KeyCode::Enter => return RouteResult::act(Action::EnterSelection),
                KeyCode::Char('c') => return RouteResult::act(Action::OpenConfirmClearQueue),
                KeyCode::Char('S') => return RouteResult::act(Action::OpenSavePlaylist),
                _ => {}
            }
        } else {
            match (ctx.view, key.code) {
                (_, KeyCode::Enter) => return RouteResult::act(Action::EnterSelection),
                (_, KeyCode::Char('a')) => return RouteResult::act(Action::AppendSelection),

                (View::Playlists, KeyCode::Char('x')) => {
                    return RouteResult::act(Action::DeleteSelectedPlaylist)
                }

                (View::Library, KeyCode::Char('A')) => {
                    return RouteResult::act(Action::OpenAlbumActions)
                }
                (View::Library, KeyCode::Char('o')) => {
                    return RouteResult::act(Action::OpenLibrarySources)
                }
                (View::Library, KeyCode::Char('U')) => {
                    return RouteResult::act(Action::StartLibraryScan)
                }
                (View::Library, KeyCode::Char('t')) => {
                    return RouteResult::act(Action::OpenRetag)
                }

                (View::FileBrowser, KeyCode::Backspace | KeyCode::Char('h')) => {
                    return RouteResult::act(Action::BrowserUp)
                }

                (View::Library | View::FileBrowser, KeyCode::Char('i')) => {
                    return RouteResult::act(Action::OpenImport)
                }
                _ => {}
            }
        }

        // Whatever is left goes to the navigator.
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => RouteResult::act(Action::CursorUp),
            KeyCode::Down | KeyCode::Char('j') => RouteResult::act(Action::CursorDown),
            KeyCode::Char('d') => RouteResult::act(Action::OpenDownloads),
            _ => RouteResult::none(),
        }
    }
}
