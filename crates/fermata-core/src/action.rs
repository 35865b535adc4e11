//! Action enum — everything a key, popup, or remote command can resolve to.

use fermata_model::session::View;

/// Which pane owns list-navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    Queue,
}

/// Prefix keys that open a multi-key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Favorite, // 'f'
    Goto,     // 'g'
}

impl Prefix {
    /// The single-key action applied when the sequence times out or the
    /// follow-up key is unrecognized.
    pub fn default_action(self) -> Action {
        match self {
            Self::Favorite => Action::ToggleFavorite,
            Self::Goto     => Action::Noop,
        }
    }

    /// Compound resolution for a follow-up key character.
    pub fn resolve(self, c: char) -> Option<Action> {
        match (self, c) {
            (Self::Favorite, 'f') => Some(Action::ToggleFavorite),
            (Self::Favorite, 's') => Some(Action::SeedRadioFromSelection),
            (Self::Goto, 'g')     => Some(Action::CursorHome),
            (Self::Goto, 'e')     => Some(Action::CursorEnd),
            _ => None,
        }
    }
}

/// What a Confirm popup was asking about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmKind {
    ClearQueue,
    DeletePlaylist(String),
}

/// What a TextInput popup collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputKind {
    SavePlaylist,
}

/// Entries of the album sub-popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumAction {
    QueueAlbum,
    PlayAlbum,
    RetagAlbum,
}

/// All actions that can flow through the system. The key router and the
/// popup handlers produce them; the dispatcher applies them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Transport ────────────────────────────────────────────────────────────
    TogglePause,
    Stop,
    Next,
    Previous,
    JumpToFirst, // debounced jump to the queue head
    JumpToLast,  // debounced jump to the queue tail
    SeekForward,
    SeekBackward,
    VolumeUp,
    VolumeDown,
    CycleRepeat,
    ToggleShuffle,
    ToggleRadio, // repeat-mode Radio on/off
    Undo,
    Redo,

    // ── Navigation ───────────────────────────────────────────────────────────
    SwitchView(View),
    FocusToggle,
    ToggleQueuePanel,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,
    EnterSelection,  // activate the focused list's selection
    AppendSelection, // add selection to the queue without playing
    BrowserUp,       // file browser: parent directory

    // ── Prefix sequences ─────────────────────────────────────────────────────
    ToggleFavorite,
    SeedRadioFromSelection,

    // ── Search ───────────────────────────────────────────────────────────────
    OpenSearch,

    // ── Popups / flows ───────────────────────────────────────────────────────
    ShowHelp,
    OpenConfirmClearQueue,
    OpenSavePlaylist,
    DeleteSelectedPlaylist,
    OpenLibrarySources,
    OpenAlbumActions,
    OpenDownloads,
    OpenImport,
    OpenRetag,
    StartLibraryScan,
    ConfirmAccepted(ConfirmKind),
    TextSubmitted { kind: TextInputKind, value: String },
    AlbumActionChosen(AlbumAction),
    ImportConfirmed,
    RetagApplied,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}
