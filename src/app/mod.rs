mod tui;

#[cfg(test)]
mod tests;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::catalog::{Catalog, Episode, description_text, format_duration, truncate};
use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::db::Database;
use crate::paths::cache_file_path;
use crate::player::{MpvElement, PlayerStore, PlayerView};

const HEADLESS_TICK: Duration = Duration::from_millis(200);

pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_cli(&cli);
    info!(api = %settings.api_url, cache = settings.use_cache, "starting");

    match cli.command {
        Some(Command::ClearCache) => run_clear_cache()?,
        Some(Command::List) => run_list(&open_catalog(&settings), settings.listing_limit)?,
        Some(Command::Show { id }) => run_show(&open_catalog(&settings), &id)?,
        Some(Command::Play { ids }) => run_play(&open_catalog(&settings), &settings, &ids)?,
        Some(Command::Tui) | None => tui::run_tui(&open_catalog(&settings), &settings)?,
    }

    Ok(())
}

fn run_list(catalog: &Catalog, limit: usize) -> Result<()> {
    let episodes = catalog.fetch_listing(limit)?;
    if episodes.is_empty() {
        println!("No episodes published yet.");
        return Ok(());
    }

    println!(
        "{:<36} {:<44} {:<10} {:<9}",
        "ID", "TITLE", "DATE", "DURATION"
    );
    for episode in episodes {
        println!(
            "{:<36} {:<44} {:<10} {:<9}",
            truncate(&episode.id, 36),
            truncate(&episode.title, 44),
            episode.published_at,
            episode.duration_as_string
        );
    }
    Ok(())
}

fn run_show(catalog: &Catalog, id: &str) -> Result<()> {
    let episode = catalog.fetch_episode(id)?;
    println!("{}", episode_detail_text(&episode));
    Ok(())
}

fn run_play(catalog: &Catalog, settings: &Settings, ids: &[String]) -> Result<()> {
    let episodes = ids
        .iter()
        .map(|id| catalog.fetch_episode(id))
        .collect::<Result<Vec<_>>>()?;

    let element = MpvElement::spawn(&settings.player_bin).with_context(|| {
        format!(
            "failed to start media player {}",
            settings.player_bin.display()
        )
    })?;
    let mut store = PlayerStore::new();
    let mut view = PlayerView::new(element);
    store.play_list(episodes, 0)?;
    view.sync(&store)?;

    let mut last_line = String::new();
    let mut stdout = io::stdout();
    loop {
        view.pump(&mut store)?;
        let Some(episode) = store.current_episode() else {
            break;
        };
        let line = headless_status_line(episode, view.progress(), store.is_playing());
        if line != last_line {
            write!(stdout, "\r\x1b[2K{line}")?;
            stdout.flush()?;
            last_line = line;
        }
        thread::sleep(HEADLESS_TICK);
    }

    println!("\nQueue finished.");
    Ok(())
}

fn run_clear_cache() -> Result<()> {
    let db = open_cache_db()?;
    let removed = db.clear_pages()?;
    println!("Removed {removed} cached response(s).");
    Ok(())
}

fn open_catalog(settings: &Settings) -> Catalog {
    let catalog = Catalog::new(&settings.api_url, settings.request_policy);
    if !settings.use_cache {
        return catalog;
    }
    match open_cache_db() {
        Ok(db) => catalog.with_cache(db, settings.revalidate_after),
        Err(err) => {
            warn!("running without response cache: {err:#}");
            catalog
        }
    }
}

fn open_cache_db() -> Result<Database> {
    let db_path = cache_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

pub(crate) fn episode_detail_text(episode: &Episode) -> String {
    format!(
        "{}\n{}\n{} | {}\n\n{}",
        episode.title,
        episode.members,
        episode.published_at,
        episode.duration_as_string,
        description_text(&episode.description)
    )
}

pub(crate) fn headless_status_line(episode: &Episode, progress: u64, playing: bool) -> String {
    let state = if playing { "playing" } else { "paused" };
    format!(
        "[{} / {}] {} ({state})",
        format_duration(progress),
        episode.duration_as_string,
        truncate(&episode.title, 60)
    )
}
