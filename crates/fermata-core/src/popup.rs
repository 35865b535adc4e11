//! Popup stack with fixed arbitration.
//!
//! Several popups can be open at once (a scan report can land while a
//! confirm is up), but exactly one is authoritative for key input: the one
//! with the highest rank. Errors always outrank everything else, so a
//! failure surfaces immediately no matter what the user was doing. Closing
//! the authoritative popup reveals the next-ranked one intact.
//!
//! At most one popup of a given kind is open; opening a second replaces
//! the first.

use crossterm::event::{Event, KeyCode, KeyEvent};
use std::path::PathBuf;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use fermata_model::scan::ScanReport;

use crate::action::{Action, AlbumAction, ConfirmKind, TextInputKind};

const ALBUM_ACTIONS: [AlbumAction; 3] =
    [AlbumAction::QueueAlbum, AlbumAction::PlayAlbum, AlbumAction::RetagAlbum];

// ── Popup kinds ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Popup {
    Error { message: String },
    ScanReport(ScanReport),
    Help,
    Confirm { kind: ConfirmKind, prompt: String },
    TextInput { kind: TextInputKind, prompt: String, input: Input },
    LibrarySources { dirs: Vec<PathBuf>, cursor: usize },
    AlbumActions { album: String, cursor: usize },
    Downloads,
    Import { path: PathBuf },
    Retag { album: String },
}

impl Popup {
    pub fn text_input(kind: TextInputKind, prompt: impl Into<String>) -> Self {
        Self::TextInput { kind, prompt: prompt.into(), input: Input::default() }
    }

    /// Arbitration rank; higher wins key input.
    fn rank(&self) -> u8 {
        match self {
            Self::Error { .. } => 10,
            Self::ScanReport(_) => 9,
            Self::Help => 8,
            Self::Confirm { .. } => 7,
            Self::TextInput { .. } => 6,
            Self::LibrarySources { .. } => 5,
            Self::AlbumActions { .. } => 4,
            Self::Downloads => 3,
            Self::Import { .. } => 2,
            Self::Retag { .. } => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error { .. } => "error",
            Self::ScanReport(_) => "scan-report",
            Self::Help => "help",
            Self::Confirm { .. } => "confirm",
            Self::TextInput { .. } => "text-input",
            Self::LibrarySources { .. } => "library-sources",
            Self::AlbumActions { .. } => "album-actions",
            Self::Downloads => "downloads",
            Self::Import { .. } => "import",
            Self::Retag { .. } => "retag",
        }
    }
}

// ── Stack ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PopupSet {
    open: Vec<Popup>,
}

impl PopupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Open a popup, replacing any existing one of the same kind.
    pub fn open(&mut self, popup: Popup) {
        self.open.retain(|p| p.rank() != popup.rank());
        self.open.push(popup);
    }

    /// The popup that currently owns key input.
    pub fn authoritative(&self) -> Option<&Popup> {
        self.open.iter().max_by_key(|p| p.rank())
    }

    /// Popups in paint order, authoritative last (topmost).
    pub fn render_order(&self) -> Vec<&Popup> {
        let mut order: Vec<&Popup> = self.open.iter().collect();
        order.sort_by_key(|p| p.rank());
        order
    }

    /// Feed a key to the authoritative popup. All keys are consumed while
    /// any popup is open; some produce follow-up actions.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let Some(top) = self
            .open
            .iter()
            .enumerate()
            .max_by_key(|(_, p)| p.rank())
            .map(|(i, _)| i)
        else {
            return Vec::new();
        };

        match Self::verdict(&mut self.open[top], key) {
            Verdict::Keep => Vec::new(),
            Verdict::Close => {
                self.open.remove(top);
                Vec::new()
            }
            Verdict::CloseWith(action) => {
                self.open.remove(top);
                vec![action]
            }
        }
    }

    fn verdict(popup: &mut Popup, key: KeyEvent) -> Verdict {
        match popup {
            Popup::Error { .. } => Verdict::Close, // any key acknowledges
            Popup::ScanReport(_) => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::Help => match key.code {
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::Confirm { kind, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    Verdict::CloseWith(Action::ConfirmAccepted(kind.clone()))
                }
                KeyCode::Char('n') | KeyCode::Esc => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::TextInput { kind, input, .. } => match key.code {
                KeyCode::Enter => {
                    let value = input.value().trim().to_string();
                    if value.is_empty() {
                        Verdict::Close
                    } else {
                        Verdict::CloseWith(Action::TextSubmitted { kind: *kind, value })
                    }
                }
                KeyCode::Esc => Verdict::Close,
                _ => {
                    input.handle_event(&Event::Key(key));
                    Verdict::Keep
                }
            },
            Popup::LibrarySources { dirs, cursor } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *cursor = cursor.saturating_sub(1);
                    Verdict::Keep
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    *cursor = (*cursor + 1).min(dirs.len().saturating_sub(1));
                    Verdict::Keep
                }
                KeyCode::Enter => Verdict::CloseWith(Action::StartLibraryScan),
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('o') => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::AlbumActions { cursor, .. } => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    *cursor = cursor.saturating_sub(1);
                    Verdict::Keep
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    *cursor = (*cursor + 1).min(ALBUM_ACTIONS.len() - 1);
                    Verdict::Keep
                }
                KeyCode::Enter => {
                    let chosen = ALBUM_ACTIONS[(*cursor).min(ALBUM_ACTIONS.len() - 1)];
                    Verdict::CloseWith(Action::AlbumActionChosen(chosen))
                }
                KeyCode::Esc | KeyCode::Char('q') => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::Downloads => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('d') => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::Import { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Verdict::CloseWith(Action::ImportConfirmed),
                KeyCode::Char('n') | KeyCode::Esc => Verdict::Close,
                _ => Verdict::Keep,
            },
            Popup::Retag { .. } => match key.code {
                KeyCode::Enter => Verdict::CloseWith(Action::RetagApplied),
                KeyCode::Esc | KeyCode::Char('q') => Verdict::Close,
                _ => Verdict::Keep,
            },
        }
    }
}

enum Verdict {
    Keep,
    Close,
    CloseWith(Action),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_one_popup_per_kind() {
        let mut popups = PopupSet::new();
        popups.open(Popup::Error { message: "first".into() });
        popups.open(Popup::Error { message: "second".into() });

        assert_eq!(popups.render_order().len(), 1);
        match popups.authoritative() {
            Some(Popup::Error { message }) => assert_eq!(message, "second"),
            other => panic!("unexpected popup: {other:?}"),
        }
    }

    #[test]
    fn test_error_outranks_open_confirm() {
        let mut popups = PopupSet::new();
        popups.open(Popup::Confirm {
            kind: ConfirmKind::ClearQueue,
            prompt: "Clear the queue?".into(),
        });
        popups.open(Popup::Error { message: "backend died".into() });

        assert!(matches!(popups.authoritative(), Some(Popup::Error { .. })));

        // 'y' acknowledges the error instead of accepting the confirm.
        let actions = popups.handle_key(key(KeyCode::Char('y')));
        assert!(actions.is_empty());
        assert!(matches!(popups.authoritative(), Some(Popup::Confirm { .. })));
    }

    #[test]
    fn test_confirm_accept_and_decline() {
        let mut popups = PopupSet::new();
        popups.open(Popup::Confirm {
            kind: ConfirmKind::ClearQueue,
            prompt: "Clear the queue?".into(),
        });
        let actions = popups.handle_key(key(KeyCode::Enter));
        assert_eq!(actions, vec![Action::ConfirmAccepted(ConfirmKind::ClearQueue)]);
        assert!(popups.is_empty());

        popups.open(Popup::Confirm {
            kind: ConfirmKind::DeletePlaylist("mix".into()),
            prompt: "Delete?".into(),
        });
        let actions = popups.handle_key(key(KeyCode::Esc));
        assert!(actions.is_empty());
        assert!(popups.is_empty());
    }

    #[test]
    fn test_text_input_collects_then_submits() {
        let mut popups = PopupSet::new();
        popups.open(Popup::text_input(TextInputKind::SavePlaylist, "Playlist name"));

        for c in ['m', 'i', 'x'] {
            popups.handle_key(key(KeyCode::Char(c)));
        }
        let actions = popups.handle_key(key(KeyCode::Enter));
        assert_eq!(
            actions,
            vec![Action::TextSubmitted { kind: TextInputKind::SavePlaylist, value: "mix".into() }]
        );
        assert!(popups.is_empty());
    }

    #[test]
    fn test_empty_text_submit_is_dropped() {
        let mut popups = PopupSet::new();
        popups.open(Popup::text_input(TextInputKind::SavePlaylist, "Playlist name"));
        let actions = popups.handle_key(key(KeyCode::Enter));
        assert!(actions.is_empty());
        assert!(popups.is_empty());
    }

    #[test]
    fn test_album_actions_selection() {
        let mut popups = PopupSet::new();
        popups.open(Popup::AlbumActions { album: "OK Computer".into(), cursor: 0 });
        popups.handle_key(key(KeyCode::Down));
        let actions = popups.handle_key(key(KeyCode::Enter));
        assert_eq!(actions, vec![Action::AlbumActionChosen(AlbumAction::PlayAlbum)]);
    }

    #[test]
    fn test_render_order_puts_error_on_top() {
        let mut popups = PopupSet::new();
        popups.open(Popup::Help);
        popups.open(Popup::Error { message: "x".into() });
        popups.open(Popup::Downloads);

        let order = popups.render_order();
        assert_eq!(order.first().map(|p| p.label()), Some("downloads"));
        assert_eq!(order.last().map(|p| p.label()), Some("error"));
    }
}
