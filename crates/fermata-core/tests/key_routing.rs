//! Key handling through the dispatcher: prefix sequences and their timers,
//! popup arbitration, search-mode capture, and the quit path.

mod common;

use std::path::Path;

use common::*;
use crossterm::event::KeyCode;
use fermata_core::popup::Popup;
use fermata_core::{update, Message};
use fermata_model::boundary::Recommender;
use fermata_model::playback::PlayerEvent;
use fermata_model::session::View;

// ── Prefix sequences ──────────────────────────────────────────────────────────

#[test]
fn prefix_timeout_applies_the_default_exactly_once() {
    let (mut app, _h) = harness();
    app.library = numbered_tracks(3);

    let epoch = prefix_timeout_epoch(&update(&mut app, press('f'))).expect("timeout scheduled");
    assert!(app.favorites.is_empty(), "nothing happens until the sequence resolves");

    update(&mut app, Message::PrefixTimeout { epoch });
    assert!(app.is_favorite(Path::new("/m/t0.mp3")));

    // A replayed timeout must not toggle the favorite back off.
    update(&mut app, Message::PrefixTimeout { epoch });
    assert!(app.is_favorite(Path::new("/m/t0.mp3")));
    assert_eq!(app.favorites.len(), 1);
}

#[test]
fn prefix_chord_seeds_radio_and_goes_stale() {
    let (mut app, h) = harness();
    app.library = numbered_tracks(3);

    let epoch = prefix_timeout_epoch(&update(&mut app, press('f'))).expect("timeout scheduled");
    update(&mut app, press('s'));
    assert_eq!(h.recommender.current_seed().as_deref(), Some("Artist 0"));

    // The chord resolved the sequence; its timer finds a stale epoch.
    update(&mut app, Message::PrefixTimeout { epoch });
    assert!(app.favorites.is_empty());
}

#[test]
fn unrecognized_follow_up_falls_through_to_the_default_and_is_consumed() {
    let (mut app, h) = harness();
    app.library = numbered_tracks(3);
    seed_queue(&mut app, 3, 0);
    force_playing(&mut app, &h.player, 30, 200);

    let epoch = prefix_timeout_epoch(&update(&mut app, press('f'))).expect("timeout scheduled");
    // 'n' does not complete an 'f' chord: the favorite default fires and the
    // key never reaches the transport bindings.
    update(&mut app, press('n'));

    assert_eq!(app.favorites.len(), 1);
    assert_eq!(app.queue.current_index(), Some(0), "no skip happened");
    assert!(h.player.plays().is_empty());

    update(&mut app, Message::PrefixTimeout { epoch });
    assert_eq!(app.favorites.len(), 1, "the stale timer cannot fire the default again");
}

#[test]
fn goto_chords_move_the_library_cursor() {
    let (mut app, _h) = harness();
    app.library = numbered_tracks(5);
    update(&mut app, press('j'));
    update(&mut app, press('j'));
    assert_eq!(app.nav.library_cursor, 2);

    update(&mut app, press('g'));
    update(&mut app, press('e'));
    assert_eq!(app.nav.library_cursor, 4);

    update(&mut app, press('g'));
    update(&mut app, press('g'));
    assert_eq!(app.nav.library_cursor, 0);
}

#[test]
fn goto_timeout_resolves_to_nothing() {
    let (mut app, _h) = harness();
    app.library = numbered_tracks(5);
    update(&mut app, press('j'));

    let epoch = prefix_timeout_epoch(&update(&mut app, press('g'))).expect("timeout scheduled");
    let commands = update(&mut app, Message::PrefixTimeout { epoch });

    assert!(commands.is_empty());
    assert_eq!(app.nav.library_cursor, 1, "a lone 'g' moves nothing");
}

#[test]
fn pending_prefix_survives_a_popup_and_still_resolves() {
    let (mut app, _h) = harness();
    app.library = numbered_tracks(3);

    let epoch = prefix_timeout_epoch(&update(&mut app, press('f'))).expect("timeout scheduled");

    // An error lands mid-sequence and claims the next key for itself.
    update(&mut app, Message::Player(PlayerEvent::Error("backend died".into())));
    update(&mut app, press('f'));
    assert!(app.popups.is_empty(), "the key acknowledged the error");
    assert!(app.favorites.is_empty());

    // The frozen sequence still resolves through its timer.
    update(&mut app, Message::PrefixTimeout { epoch });
    assert_eq!(app.favorites.len(), 1);
}

// ── Popup arbitration ─────────────────────────────────────────────────────────

#[test]
fn error_takes_keys_ahead_of_an_open_confirm() {
    let (mut app, h) = harness();
    seed_queue(&mut app, 3, 0);

    update(&mut app, key(KeyCode::Tab));
    update(&mut app, press('c'));
    assert!(matches!(app.popups.authoritative(), Some(Popup::Confirm { .. })));

    update(&mut app, Message::Player(PlayerEvent::Error("backend died".into())));
    assert!(matches!(app.popups.authoritative(), Some(Popup::Error { .. })));

    // 'y' acknowledges the error; the confirm must not see it.
    update(&mut app, press('y'));
    assert_eq!(app.queue.len(), 3);
    assert!(matches!(app.popups.authoritative(), Some(Popup::Confirm { .. })));

    let commands = update(&mut app, press('y'));
    assert!(app.queue.is_empty());
    assert_eq!(h.player.stop_count(), 1);
    assert!(has_kind(&commands, "save-queue"));
    assert!(app.popups.is_empty());
}

#[test]
fn help_opens_and_closes_without_touching_state() {
    let (mut app, h) = harness();
    seed_queue(&mut app, 2, 0);

    update(&mut app, press('?'));
    assert!(matches!(app.popups.authoritative(), Some(Popup::Help)));

    // Transport keys are captured while the popup is up.
    update(&mut app, press('n'));
    assert_eq!(app.queue.current_index(), Some(0));

    update(&mut app, press('?'));
    assert!(app.popups.is_empty());
    assert!(h.player.plays().is_empty());
}

#[test]
fn saving_a_playlist_goes_through_the_text_popup() {
    let (mut app, _h) = harness();
    seed_queue(&mut app, 2, 0);

    update(&mut app, key(KeyCode::Tab));
    update(&mut app, press('S'));
    assert!(matches!(app.popups.authoritative(), Some(Popup::TextInput { .. })));

    for c in ['m', 'i', 'x'] {
        update(&mut app, press(c));
    }
    let commands = update(&mut app, key(KeyCode::Enter));

    assert!(app.popups.is_empty());
    assert_eq!(app.playlists.len(), 1);
    assert_eq!(app.playlists[0].name, "mix");
    assert_eq!(app.playlists[0].tracks.len(), 2);
    assert!(has_kind(&commands, "save-playlists"));
}

// ── Search-mode capture ───────────────────────────────────────────────────────

#[test]
fn search_mode_owns_keys_until_exit() {
    let (mut app, _h) = harness();
    app.library = numbered_tracks(5);

    update(&mut app, press('/'));
    let commands = update(&mut app, press('j'));
    assert_eq!(app.search.text(), "j", "navigator keys type into the input");
    assert!(has_kind(&commands, "watch-search"));
    assert_eq!(app.nav.library_cursor, 0);

    update(&mut app, key(KeyCode::Esc));
    assert!(!app.search.active);

    update(&mut app, press('j'));
    assert_eq!(app.nav.library_cursor, 1, "navigation is back after dismissal");
}

#[test]
fn committed_search_keeps_its_session_until_quit_cancels_it() {
    let (mut app, h) = harness();
    app.library = numbered_tracks(5);

    update(&mut app, press('/'));
    update(&mut app, press('a'));
    update(&mut app, key(KeyCode::Enter));
    assert!(!app.search.active);
    assert!(app.bridge.search_running(), "commit keeps the scan producing");
    assert!(!h.scanner.search(0).cancel.is_cancelled());

    update(&mut app, press('q'));
    assert!(app.should_quit);
    assert!(h.scanner.search(0).cancel.is_cancelled());
}

// ── Transport / quit ──────────────────────────────────────────────────────────

#[test]
fn seek_keys_use_the_configured_step() {
    let (mut app, h) = harness();
    seed_queue(&mut app, 1, 0);
    force_playing(&mut app, &h.player, 50, 200);

    update(&mut app, key(KeyCode::Right));
    update(&mut app, key(KeyCode::Left));
    assert_eq!(h.player.seeks(), vec![5, -5]);
}

#[test]
fn quit_snapshots_the_session_inline() {
    let (mut app, h) = harness();
    seed_queue(&mut app, 2, 1);
    update(&mut app, press('2'));

    update(&mut app, press('q'));
    assert!(app.should_quit);

    let nav = h.store.nav().expect("navigation snapshot");
    assert_eq!(nav.view, View::Playlists);
    let queue = h.store.queue().expect("queue snapshot");
    assert_eq!(queue.tracks.len(), 2);
    assert_eq!(queue.index, Some(1));
}
