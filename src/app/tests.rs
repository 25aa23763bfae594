use std::sync::mpsc;

use crossterm::event::KeyCode;

use super::tui::{
    Browser, DetailState, FetchResult, ListingState, UiAction, apply_player_action,
    drain_fetch_results, key_action, progress_gauge, selected_episode,
};
use super::{episode_detail_text, headless_status_line};
use crate::catalog::{Episode, format_duration};
use crate::player::PlayerStore;

fn episode(id: &str) -> Episode {
    Episode {
        id: id.to_string(),
        title: format!("Episode {id}"),
        thumbnail: format!("https://cdn.example.com/{id}.jpg"),
        members: "Diego and Richard".to_string(),
        duration: 120,
        duration_as_string: format_duration(120),
        description: "<p>Talking about <b>things</b> &amp; stuff</p>".to_string(),
        url: format!("https://cdn.example.com/{id}.mp3"),
        published_at: "22 jan 21".to_string(),
    }
}

fn browser_with(ids: &[&str], selected: Option<usize>) -> Browser {
    let mut browser = Browser::new();
    browser.items = ids.iter().map(|id| episode(id)).collect();
    browser.listing = ListingState::Ready;
    browser.table_state.select(selected);
    browser
}

fn current_id(store: &PlayerStore) -> Option<&str> {
    store.current_episode().map(|episode| episode.id.as_str())
}

#[test]
fn key_action_maps_transport_and_navigation_keys() {
    assert_eq!(key_action(KeyCode::Char('q')), Some(UiAction::Quit));
    assert_eq!(key_action(KeyCode::Esc), Some(UiAction::Quit));
    assert_eq!(key_action(KeyCode::Char('j')), Some(UiAction::Down));
    assert_eq!(key_action(KeyCode::Up), Some(UiAction::Up));
    assert_eq!(key_action(KeyCode::Enter), Some(UiAction::PlaySelected));
    assert_eq!(key_action(KeyCode::Char(' ')), Some(UiAction::TogglePlay));
    assert_eq!(key_action(KeyCode::Char('b')), Some(UiAction::Previous));
    assert_eq!(key_action(KeyCode::Right), Some(UiAction::SeekForward));
    assert_eq!(key_action(KeyCode::Char('x')), None);
}

#[test]
fn browser_selection_stays_within_listing() {
    let mut browser = browser_with(&["a", "b"], Some(0));
    browser.select_up();
    assert_eq!(browser.table_state.selected(), Some(0));
    browser.select_down();
    browser.select_down();
    assert_eq!(browser.table_state.selected(), Some(1));
}

#[test]
fn selected_episode_prefers_loaded_detail() {
    let mut browser = browser_with(&["a", "b"], Some(1));
    assert_eq!(
        selected_episode(&browser).map(|episode| episode.title),
        Some("Episode b".to_string())
    );

    let mut detailed = episode("b");
    detailed.title = "Episode b, full".to_string();
    browser
        .details_by_id
        .insert("b".to_string(), DetailState::Ready(detailed));
    assert_eq!(
        selected_episode(&browser).map(|episode| episode.title),
        Some("Episode b, full".to_string())
    );

    browser.table_state.select(None);
    assert!(selected_episode(&browser).is_none());
}

#[test]
fn play_selected_replaces_queue_and_starts_playing() {
    let browser = browser_with(&["a", "b"], Some(1));
    let mut store = PlayerStore::seeded(7);
    store.play(episode("z"));

    let message = apply_player_action(UiAction::PlaySelected, &browser, &mut store);

    assert_eq!(message.as_deref(), Some("Playing: Episode b"));
    assert_eq!(store.episode_list().len(), 1);
    assert_eq!(current_id(&store), Some("b"));
    assert!(store.is_playing());
}

#[test]
fn enqueue_into_empty_queue_does_not_start_playback() {
    let browser = browser_with(&["a", "b"], Some(0));
    let mut store = PlayerStore::seeded(7);

    let message = apply_player_action(UiAction::EnqueueSelected, &browser, &mut store);

    assert_eq!(message.as_deref(), Some("Queued: Episode a (1 in queue)"));
    assert_eq!(current_id(&store), Some("a"));
    assert!(!store.is_playing());
}

#[test]
fn play_from_selected_queues_whole_listing() {
    let browser = browser_with(&["a", "b", "c"], Some(1));
    let mut store = PlayerStore::seeded(7);

    let message = apply_player_action(UiAction::PlayFromSelected, &browser, &mut store);

    assert_eq!(message.as_deref(), Some("Playing 2 of 3: Episode b"));
    assert_eq!(store.episode_list().len(), 3);
    assert_eq!(store.current_index(), 1);
    assert!(store.has_next());
    assert!(store.has_previous());
}

#[test]
fn disabled_controls_report_instead_of_mutating() {
    let browser = browser_with(&["a"], Some(0));
    let mut store = PlayerStore::seeded(7);

    assert_eq!(
        apply_player_action(UiAction::TogglePlay, &browser, &mut store).as_deref(),
        Some("Nothing queued.")
    );
    assert!(!store.is_playing());

    store.play(episode("a"));
    assert_eq!(
        apply_player_action(UiAction::Next, &browser, &mut store).as_deref(),
        Some("No next episode.")
    );
    assert_eq!(
        apply_player_action(UiAction::Previous, &browser, &mut store).as_deref(),
        Some("No previous episode.")
    );
    assert_eq!(
        apply_player_action(UiAction::ToggleShuffle, &browser, &mut store).as_deref(),
        Some("Shuffle needs more than one queued episode.")
    );
    assert!(!store.is_shuffling());
    assert_eq!(current_id(&store), Some("a"));
}

#[test]
fn transport_actions_walk_queue_and_flip_flags() {
    let browser = browser_with(&["a", "b"], Some(0));
    let mut store = PlayerStore::seeded(7);
    apply_player_action(UiAction::PlayFromSelected, &browser, &mut store);

    assert_eq!(
        apply_player_action(UiAction::Next, &browser, &mut store).as_deref(),
        Some("Next: Episode b")
    );
    assert_eq!(
        apply_player_action(UiAction::Previous, &browser, &mut store).as_deref(),
        Some("Previous: Episode a")
    );
    assert_eq!(
        apply_player_action(UiAction::TogglePlay, &browser, &mut store).as_deref(),
        Some("Paused.")
    );
    assert_eq!(
        apply_player_action(UiAction::ToggleLoop, &browser, &mut store).as_deref(),
        Some("Loop on.")
    );
    assert_eq!(
        apply_player_action(UiAction::ToggleShuffle, &browser, &mut store).as_deref(),
        Some("Shuffle on.")
    );
    assert!(store.is_looping());
    assert!(store.is_shuffling());
}

#[test]
fn actions_without_selection_are_reported() {
    let browser = browser_with(&[], None);
    let mut store = PlayerStore::seeded(7);
    for action in [
        UiAction::PlaySelected,
        UiAction::EnqueueSelected,
        UiAction::PlayFromSelected,
    ] {
        assert_eq!(
            apply_player_action(action, &browser, &mut store).as_deref(),
            Some("No episode selected.")
        );
    }
    assert!(store.is_empty());
    assert_eq!(apply_player_action(UiAction::Reload, &browser, &mut store), None);
}

#[test]
fn drain_fetch_results_keeps_selected_episode_across_reload() {
    let mut browser = browser_with(&["a", "b", "c"], Some(2));
    let (tx, rx) = mpsc::channel();
    tx.send(FetchResult::Listing(Ok(vec![
        episode("new"),
        episode("a"),
        episode("b"),
        episode("c"),
    ])))
    .expect("send listing");

    drain_fetch_results(&rx, &mut browser);

    assert_eq!(browser.table_state.selected(), Some(3));
    assert_eq!(browser.status, "INFO: 4 episodes loaded.");
    assert!(matches!(browser.listing, ListingState::Ready));
}

#[test]
fn drain_fetch_results_selects_first_item_on_initial_load() {
    let mut browser = Browser::new();
    let (tx, rx) = mpsc::channel();
    tx.send(FetchResult::Listing(Ok(vec![episode("a"), episode("b")])))
        .expect("send listing");

    drain_fetch_results(&rx, &mut browser);

    assert_eq!(browser.table_state.selected(), Some(0));
}

#[test]
fn drain_fetch_results_records_failures() {
    let mut browser = Browser::new();
    let (tx, rx) = mpsc::channel();
    tx.send(FetchResult::Listing(Ok(Vec::new())))
        .expect("send listing");
    drain_fetch_results(&rx, &mut browser);
    assert_eq!(browser.status, "INFO: No episodes published yet.");
    assert_eq!(browser.table_state.selected(), None);

    tx.send(FetchResult::Listing(Err("HTTP status 500".to_string())))
        .expect("send error");
    tx.send(FetchResult::Detail {
        id: "a".to_string(),
        result: Err("timed out".to_string()),
    })
    .expect("send detail");
    drain_fetch_results(&rx, &mut browser);

    assert_eq!(
        browser.status,
        "ERROR: Could not load episodes: HTTP status 500"
    );
    assert!(matches!(browser.listing, ListingState::Failed(ref err) if err == "HTTP status 500"));
    assert!(matches!(
        browser.details_by_id.get("a"),
        Some(DetailState::Failed(_))
    ));
}

#[test]
fn progress_gauge_reports_ratio_and_clock() {
    let mut store = PlayerStore::seeded(7);
    assert_eq!(
        progress_gauge(&store, 0),
        (0.0, "00:00:00 / 00:00:00".to_string())
    );

    store.play(episode("a"));
    let (ratio, label) = progress_gauge(&store, 30);
    assert!((ratio - 0.25).abs() < f64::EPSILON);
    assert_eq!(label, "00:00:30 / 00:02:00");

    let (ratio, _) = progress_gauge(&store, 500);
    assert!((ratio - 1.0).abs() < f64::EPSILON);
}

#[test]
fn episode_detail_text_renders_plain_description() {
    let text = episode_detail_text(&episode("a"));
    assert_eq!(
        text,
        "Episode a\nDiego and Richard\n22 jan 21 | 00:02:00\n\nTalking about things & stuff"
    );
}

#[test]
fn headless_status_line_shows_clock_and_state() {
    let episode = episode("a");
    assert_eq!(
        headless_status_line(&episode, 10, true),
        "[00:00:10 / 00:02:00] Episode a (playing)"
    );
    assert_eq!(
        headless_status_line(&episode, 0, false),
        "[00:00:00 / 00:02:00] Episode a (paused)"
    );
}
