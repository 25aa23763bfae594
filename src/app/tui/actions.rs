use std::sync::mpsc;

use crossterm::event::KeyCode;
use tracing::{debug, warn};

use crate::catalog::{Catalog, Episode, truncate};
use crate::player::{PlayerStore, TransportControls};

use super::{Browser, DetailState, FetchResult, ListingState, UiAction};

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(crate) fn key_action(code: KeyCode) -> Option<UiAction> {
    let action = match code {
        KeyCode::Char('q') | KeyCode::Esc => UiAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => UiAction::Up,
        KeyCode::Down | KeyCode::Char('j') => UiAction::Down,
        KeyCode::Char('r') => UiAction::Reload,
        KeyCode::Enter => UiAction::PlaySelected,
        KeyCode::Char('a') => UiAction::EnqueueSelected,
        KeyCode::Char('p') => UiAction::PlayFromSelected,
        KeyCode::Char(' ') => UiAction::TogglePlay,
        KeyCode::Char('n') => UiAction::Next,
        KeyCode::Char('b') => UiAction::Previous,
        KeyCode::Char('l') => UiAction::ToggleLoop,
        KeyCode::Char('s') => UiAction::ToggleShuffle,
        KeyCode::Left => UiAction::SeekBack,
        KeyCode::Right => UiAction::SeekForward,
        _ => return None,
    };
    Some(action)
}

/// The highlighted episode, preferring the freshly fetched detail over the
/// listing copy.
pub(crate) fn selected_episode(browser: &Browser) -> Option<Episode> {
    let item = browser.items.get(browser.table_state.selected()?)?;
    let detail = browser
        .details_by_id
        .get(&item.id)
        .and_then(DetailState::episode);
    Some(detail.unwrap_or(item).clone())
}

fn current_title(store: &PlayerStore) -> String {
    store
        .current_episode()
        .map(|episode| truncate(&episode.title, 50))
        .unwrap_or_else(|| "-".to_string())
}

/// Applies a transport or queue action to the store. Returns the status
/// message to show, if any. Disabled controls are reported, not applied.
pub(crate) fn apply_player_action(
    action: UiAction,
    browser: &Browser,
    store: &mut PlayerStore,
) -> Option<String> {
    let controls = TransportControls::for_store(store);
    match action {
        UiAction::PlaySelected => {
            let Some(episode) = selected_episode(browser) else {
                return Some("No episode selected.".to_string());
            };
            let message = format!("Playing: {}", truncate(&episode.title, 50));
            store.play(episode);
            Some(message)
        }
        UiAction::EnqueueSelected => {
            let Some(episode) = selected_episode(browser) else {
                return Some("No episode selected.".to_string());
            };
            let message = format!("Queued: {}", truncate(&episode.title, 50));
            store.enqueue(episode);
            Some(format!("{message} ({} in queue)", store.episode_list().len()))
        }
        UiAction::PlayFromSelected => {
            let Some(selected) = browser.table_state.selected() else {
                return Some("No episode selected.".to_string());
            };
            let list = browser
                .items
                .iter()
                .map(|item| {
                    browser
                        .details_by_id
                        .get(&item.id)
                        .and_then(DetailState::episode)
                        .unwrap_or(item)
                        .clone()
                })
                .collect::<Vec<_>>();
            let len = list.len();
            match store.play_list(list, selected) {
                Ok(()) => Some(format!(
                    "Playing {} of {len}: {}",
                    selected + 1,
                    current_title(store)
                )),
                Err(err) => Some(format!("Cannot play listing: {err}")),
            }
        }
        UiAction::TogglePlay => {
            if !controls.play {
                return Some("Nothing queued.".to_string());
            }
            store.toggle_play();
            Some(if store.is_playing() { "Playing." } else { "Paused." }.to_string())
        }
        UiAction::Next => {
            if !controls.next {
                return Some("No next episode.".to_string());
            }
            store.play_next();
            Some(format!("Next: {}", current_title(store)))
        }
        UiAction::Previous => {
            if !controls.previous {
                return Some("No previous episode.".to_string());
            }
            store.play_previous();
            Some(format!("Previous: {}", current_title(store)))
        }
        UiAction::ToggleLoop => {
            if !controls.repeat {
                return Some("Nothing queued.".to_string());
            }
            store.toggle_loop();
            Some(format!("Loop {}.", on_off(store.is_looping())))
        }
        UiAction::ToggleShuffle => {
            if !controls.shuffle {
                return Some("Shuffle needs more than one queued episode.".to_string());
            }
            store.toggle_shuffle();
            Some(format!("Shuffle {}.", on_off(store.is_shuffling())))
        }
        UiAction::Quit
        | UiAction::Up
        | UiAction::Down
        | UiAction::Reload
        | UiAction::SeekBack
        | UiAction::SeekForward => None,
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

pub(super) fn spawn_listing_fetch(catalog: &Catalog, limit: usize, tx: &mpsc::Sender<FetchResult>) {
    let catalog = catalog.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = catalog
            .fetch_listing(limit)
            .map_err(|err| format!("{err:#}"));
        let _ = tx.send(FetchResult::Listing(result));
    });
}

pub(super) fn ensure_selected_detail(
    catalog: &Catalog,
    browser: &mut Browser,
    tx: &mpsc::Sender<FetchResult>,
) {
    let Some(selected_idx) = browser.table_state.selected() else {
        return;
    };
    let Some(item) = browser.items.get(selected_idx) else {
        return;
    };
    if browser.details_by_id.contains_key(&item.id) {
        return;
    }

    debug!(episode = %item.id, "fetching episode detail");
    browser
        .details_by_id
        .insert(item.id.clone(), DetailState::Loading);
    let id = item.id.clone();
    let catalog = catalog.clone();
    let tx = tx.clone();
    std::thread::spawn(move || {
        let result = catalog.fetch_episode(&id).map_err(|err| format!("{err:#}"));
        let _ = tx.send(FetchResult::Detail { id, result });
    });
}

pub(crate) fn drain_fetch_results(rx: &mpsc::Receiver<FetchResult>, browser: &mut Browser) {
    while let Ok(result) = rx.try_recv() {
        match result {
            FetchResult::Listing(Ok(items)) => {
                let preferred = browser
                    .table_state
                    .selected()
                    .and_then(|idx| browser.items.get(idx))
                    .map(|item| item.id.clone());
                browser.items = items;
                browser.listing = ListingState::Ready;
                let selected = preferred
                    .and_then(|id| browser.items.iter().position(|item| item.id == id))
                    .or((!browser.items.is_empty()).then_some(0));
                browser.table_state.select(selected);
                browser.status = if browser.items.is_empty() {
                    status_info("No episodes published yet.")
                } else {
                    status_info(&format!("{} episodes loaded.", browser.items.len()))
                };
            }
            FetchResult::Listing(Err(err)) => {
                warn!("episode listing failed: {err}");
                browser.status = status_error(&format!("Could not load episodes: {err}"));
                browser.listing = ListingState::Failed(err);
            }
            FetchResult::Detail { id, result } => {
                let state = match result {
                    Ok(episode) => DetailState::Ready(episode),
                    Err(err) => {
                        warn!(episode = %id, "episode detail failed: {err}");
                        DetailState::Failed(err)
                    }
                };
                browser.details_by_id.insert(id, state);
            }
        }
    }
}
