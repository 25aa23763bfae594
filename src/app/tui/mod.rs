mod actions;
mod render;
mod session;

use std::collections::HashMap;
use std::io;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use tracing::{error, info};

use crate::catalog::{Catalog, Episode};
use crate::config::Settings;
use crate::player::{MpvElement, PlayerStore, PlayerView};

use self::actions::{ensure_selected_detail, spawn_listing_fetch, status_error, status_info};
use self::render::draw_tui;
use self::session::TuiSession;

pub(crate) use self::actions::{apply_player_action, drain_fetch_results, key_action};
#[cfg(test)]
pub(crate) use self::actions::selected_episode;
#[cfg(test)]
pub(crate) use self::render::progress_gauge;

const SEEK_STEP_SECS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiAction {
    Quit,
    Up,
    Down,
    Reload,
    PlaySelected,
    EnqueueSelected,
    PlayFromSelected,
    TogglePlay,
    Next,
    Previous,
    ToggleLoop,
    ToggleShuffle,
    SeekBack,
    SeekForward,
}

#[derive(Debug, Clone)]
pub(crate) enum ListingState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub(crate) enum DetailState {
    Loading,
    Ready(Episode),
    Failed(String),
}

impl DetailState {
    pub(crate) fn episode(&self) -> Option<&Episode> {
        match self {
            Self::Ready(episode) => Some(episode),
            Self::Loading | Self::Failed(_) => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum FetchResult {
    Listing(Result<Vec<Episode>, String>),
    Detail {
        id: String,
        result: Result<Episode, String>,
    },
}

/// Everything on screen that is not player state: the listing, its
/// selection, lazily loaded details and the status line.
#[derive(Debug)]
pub(crate) struct Browser {
    pub(crate) items: Vec<Episode>,
    pub(crate) table_state: TableState,
    pub(crate) listing: ListingState,
    pub(crate) details_by_id: HashMap<String, DetailState>,
    pub(crate) status: String,
}

impl Browser {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            table_state: TableState::default(),
            listing: ListingState::Loading,
            details_by_id: HashMap::new(),
            status: status_info("Loading episodes..."),
        }
    }

    pub(crate) fn select_up(&mut self) {
        if let Some(selected) = self.table_state.selected() {
            self.table_state.select(Some(selected.saturating_sub(1)));
        }
    }

    pub(crate) fn select_down(&mut self) {
        if let Some(selected) = self.table_state.selected()
            && !self.items.is_empty()
        {
            let next = (selected + 1).min(self.items.len().saturating_sub(1));
            self.table_state.select(Some(next));
        }
    }
}

pub(crate) fn run_tui(catalog: &Catalog, settings: &Settings) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchResult>();
    let mut browser = Browser::new();
    spawn_listing_fetch(catalog, settings.listing_limit, &fetch_tx);

    let mut store = PlayerStore::new();
    let mut view = match MpvElement::spawn(&settings.player_bin) {
        Ok(element) => Some(PlayerView::new(element)),
        Err(err) => {
            error!("media player unavailable: {err}");
            browser.status = status_error(&format!("Playback unavailable: {err}"));
            None
        }
    };

    loop {
        drain_fetch_results(&fetch_rx, &mut browser);
        ensure_selected_detail(catalog, &mut browser, &fetch_tx);
        if let Some(view) = view.as_mut()
            && let Err(err) = view.pump(&mut store)
        {
            browser.status = status_error(&format!("Player error: {err:#}"));
        }

        let progress = view.as_ref().map(PlayerView::progress).unwrap_or(0);
        terminal.draw(|frame| draw_tui(frame, &mut browser, &store, progress))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(action) = key_action(key.code) else {
            continue;
        };

        match action {
            UiAction::Quit => {
                info!("quit requested");
                break;
            }
            UiAction::Up => browser.select_up(),
            UiAction::Down => browser.select_down(),
            UiAction::Reload => {
                browser.listing = ListingState::Loading;
                browser.details_by_id.clear();
                browser.status = status_info("Reloading episodes...");
                spawn_listing_fetch(catalog, settings.listing_limit, &fetch_tx);
            }
            _ => {
                let Some(view) = view.as_mut() else {
                    browser.status = status_error("Playback unavailable: media player not running.");
                    continue;
                };
                let outcome = match action {
                    UiAction::SeekBack => view.seek_by(-SEEK_STEP_SECS, &store).map(|_| None),
                    UiAction::SeekForward => view.seek_by(SEEK_STEP_SECS, &store).map(|_| None),
                    _ => Ok(apply_player_action(action, &browser, &mut store)),
                };
                match outcome.and_then(|message| view.sync(&store).map(|_| message)) {
                    Ok(Some(message)) => browser.status = status_info(&message),
                    Ok(None) => {}
                    Err(err) => browser.status = status_error(&format!("Player error: {err:#}")),
                }
            }
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
