use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap};

use crate::catalog::{description_text, format_duration, truncate};
use crate::player::{PlayerStore, TransportControls};

use super::{Browser, DetailState, ListingState};

const ACCENT: Color = Color::Rgb(4, 211, 97);
const SECONDARY: Color = Color::Rgb(159, 117, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);

pub(super) fn draw_tui(frame: &mut Frame, browser: &mut Browser, store: &PlayerStore, progress: u64) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], browser, store);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    draw_listing(frame, body_chunks[0], browser);
    draw_detail(frame, body_chunks[1], browser);

    draw_player_bar(frame, chunks[2], store, progress);

    let status_widget = Paragraph::new(browser.status.clone())
        .style(status_style(&browser.status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);
}

fn draw_header(frame: &mut Frame, area: Rect, browser: &Browser, store: &PlayerStore) {
    let queue_text = if store.is_empty() {
        "queue empty".to_string()
    } else {
        format!(
            "queue {}/{}",
            store.current_index() + 1,
            store.episode_list().len()
        )
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "PODCASTR",
            Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{} episodes", browser.items.len()),
            Style::default().fg(MUTED),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(queue_text, Style::default().fg(MUTED)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Home"));
    frame.render_widget(header, area);
}

fn draw_listing(frame: &mut Frame, area: Rect, browser: &mut Browser) {
    let placeholder = match &browser.listing {
        ListingState::Loading if browser.items.is_empty() => Some("Loading episodes...".to_string()),
        ListingState::Failed(err) if browser.items.is_empty() => {
            Some(format!("Could not load episodes.\n\n{err}\n\nPress r to retry."))
        }
        _ if browser.items.is_empty() => Some("No episodes published yet.".to_string()),
        _ => None,
    };
    if let Some(text) = placeholder {
        let widget = Paragraph::new(text)
            .style(Style::default().fg(MUTED))
            .wrap(Wrap { trim: true })
            .block(panel_block("Latest Episodes"));
        frame.render_widget(widget, area);
        return;
    }

    let rows: Vec<Row> = browser
        .items
        .iter()
        .map(|episode| {
            Row::new(vec![
                Cell::from(episode.title.clone()),
                Cell::from(episode.members.clone()),
                Cell::from(episode.published_at.clone()),
                Cell::from(episode.duration_as_string.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Percentage(25),
            Constraint::Length(10),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec!["Podcast", "Members", "Date", "Duration"])
            .style(Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD)),
    )
    .block(panel_block("Latest Episodes"))
    .row_highlight_style(
        Style::default()
            .bg(SECONDARY)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, &mut browser.table_state);
}

fn draw_detail(frame: &mut Frame, area: Rect, browser: &Browser) {
    let selected = browser
        .table_state
        .selected()
        .and_then(|idx| browser.items.get(idx));
    let text = match selected {
        Some(item) => {
            let detail = browser.details_by_id.get(&item.id);
            let episode = detail.and_then(DetailState::episode).unwrap_or(item);
            let mut text = format!(
                "{}\n\n{}\n{} | {}\n\n",
                episode.title, episode.members, episode.published_at, episode.duration_as_string
            );
            match detail {
                Some(DetailState::Loading) | None => text.push_str("Loading description..."),
                Some(DetailState::Failed(err)) => {
                    text.push_str(&format!("Description unavailable: {}", truncate(err, 120)));
                }
                Some(DetailState::Ready(_)) => text.push_str(&description_text(&episode.description)),
            }
            text
        }
        None => "Select an episode to see its details.".to_string(),
    };

    let widget = Paragraph::new(text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .wrap(Wrap { trim: true })
        .block(panel_block("Episode"));
    frame.render_widget(widget, area);
}

fn draw_player_bar(frame: &mut Frame, area: Rect, store: &PlayerStore, progress: u64) {
    let block = panel_block("Now Playing");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let now_playing = match store.current_episode() {
        Some(episode) => Line::from(vec![
            Span::styled(
                truncate(&episode.title, 60),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ", Style::default()),
            Span::styled(truncate(&episode.members, 40), Style::default().fg(MUTED)),
        ]),
        None => Line::from(Span::styled(
            "Select a podcast to listen to",
            Style::default().fg(MUTED),
        )),
    };
    frame.render_widget(Paragraph::new(now_playing).alignment(Alignment::Center), rows[0]);

    let (ratio, label) = progress_gauge(store, progress);
    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(ACCENT)
                .bg(Color::Rgb(40, 32, 64))
                .add_modifier(Modifier::BOLD),
        )
        .label(label)
        .ratio(ratio);
    frame.render_widget(gauge, rows[1]);

    let controls = Paragraph::new(transport_line(store)).alignment(Alignment::Center);
    frame.render_widget(controls, rows[2]);
}

/// Gauge ratio and its `elapsed / total` label.
pub(crate) fn progress_gauge(store: &PlayerStore, progress: u64) -> (f64, String) {
    let Some(episode) = store.current_episode() else {
        return (0.0, format!("{} / {}", format_duration(0), format_duration(0)));
    };
    let ratio = if episode.duration == 0 {
        0.0
    } else {
        (progress as f64 / episode.duration as f64).clamp(0.0, 1.0)
    };
    (
        ratio,
        format!("{} / {}", format_duration(progress), episode.duration_as_string),
    )
}

fn pill_active() -> Style {
    Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default()
        .bg(Color::Rgb(72, 82, 96))
        .fg(Color::Rgb(230, 235, 242))
}

fn pill_disabled() -> Style {
    Style::default()
        .bg(Color::Rgb(30, 32, 40))
        .fg(Color::Rgb(90, 95, 105))
}

fn control_style(enabled: bool, active: bool) -> Style {
    match (enabled, active) {
        (false, _) => pill_disabled(),
        (true, true) => pill_active(),
        (true, false) => pill_inactive(),
    }
}

fn transport_line(store: &PlayerStore) -> Line<'static> {
    let controls = TransportControls::for_store(store);
    let play_label = if store.is_playing() { " PAUSE " } else { " PLAY " };
    Line::from(vec![
        Span::styled(
            " SHUFFLE ",
            control_style(controls.shuffle, store.is_shuffling()),
        ),
        Span::styled(" ", Style::default()),
        Span::styled(" PREV ", control_style(controls.previous, false)),
        Span::styled(" ", Style::default()),
        Span::styled(play_label, control_style(controls.play, true)),
        Span::styled(" ", Style::default()),
        Span::styled(" NEXT ", control_style(controls.next, false)),
        Span::styled(" ", Style::default()),
        Span::styled(" LOOP ", control_style(controls.repeat, store.is_looping())),
        Span::styled(
            "   ↑/↓ move  Enter play  a queue  p play all  space pause  n/b next/prev  ←/→ seek  s shuffle  l loop  r reload  q quit",
            Style::default().fg(MUTED),
        ),
    ])
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(SECONDARY)
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
