use chrono::{DateTime, Datelike, NaiveDate};
use quick_xml::escape::unescape;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A podcast episode as the app shows it. Built once from an API payload and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Episode {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) thumbnail: String,
    pub(crate) members: String,
    pub(crate) duration: u64,
    pub(crate) duration_as_string: String,
    pub(crate) description: String,
    pub(crate) url: String,
    pub(crate) published_at: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum EpisodeError {
    #[error("malformed episode payload: {0}")]
    Malformed(String),
    #[error("episode {id} has an invalid duration: {raw}")]
    InvalidDuration { id: String, raw: String },
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    id: Value,
    title: String,
    #[serde(default)]
    members: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    description: String,
    file: RawFile,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    url: String,
    duration: Value,
}

impl TryFrom<RawEpisode> for Episode {
    type Error = EpisodeError;

    fn try_from(raw: RawEpisode) -> Result<Self, Self::Error> {
        let id = match raw.id {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            other => return Err(EpisodeError::Malformed(format!("unexpected id {other}"))),
        };
        let duration = parse_duration_seconds(&raw.file.duration).ok_or_else(|| {
            EpisodeError::InvalidDuration {
                id: id.clone(),
                raw: raw.file.duration.to_string(),
            }
        })?;

        Ok(Self {
            id,
            title: raw.title,
            thumbnail: raw.thumbnail,
            members: raw.members,
            duration,
            duration_as_string: format_duration(duration),
            description: raw.description,
            url: raw.file.url,
            published_at: format_published_at(&raw.published_at),
        })
    }
}

pub(crate) fn parse_episode(raw: &str) -> Result<Episode, EpisodeError> {
    let parsed: RawEpisode =
        serde_json::from_str(raw).map_err(|err| EpisodeError::Malformed(err.to_string()))?;
    Episode::try_from(parsed)
}

pub(crate) fn parse_episode_list(raw: &str) -> Result<Vec<Episode>, EpisodeError> {
    let parsed: Vec<RawEpisode> =
        serde_json::from_str(raw).map_err(|err| EpisodeError::Malformed(err.to_string()))?;
    parsed.into_iter().map(Episode::try_from).collect()
}

fn parse_duration_seconds(value: &Value) -> Option<u64> {
    let seconds = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.floor() as u64)
}

/// `HH:MM:SS`, every field zero padded.
pub(crate) fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

const MONTHS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// `d mmm yy` with Brazilian Portuguese month abbreviations, e.g. `8 jan 21`.
pub(crate) fn format_published_at(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return short_date(dt.date_naive());
    }
    // json-server fixtures often carry a bare "YYYY-MM-DD HH:MM:SS"
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => short_date(date),
        Err(_) => trimmed.to_string(),
    }
}

fn short_date(date: NaiveDate) -> String {
    format!(
        "{} {} {:02}",
        date.day(),
        MONTHS_PT_BR[date.month0() as usize],
        date.year().rem_euclid(100)
    )
}

/// Renders an HTML description as plain text for the terminal.
pub(crate) fn description_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let mut tag = String::new();
                for inner in chars.by_ref() {
                    if inner == '>' {
                        break;
                    }
                    tag.push(inner);
                }
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "p" | "br" | "li" | "div") && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            '&' => {
                let mut entity = String::new();
                while let Some(&next) = chars.peek() {
                    if next == ';' || next.is_whitespace() || entity.len() > 32 {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                if chars.peek() == Some(&';') {
                    chars.next();
                    let raw = format!("&{entity};");
                    match unescape(&raw) {
                        Ok(decoded) => out.push_str(&decoded.replace('\u{a0}', " ")),
                        Err(_) => out.push_str(&raw),
                    }
                } else {
                    out.push('&');
                    out.push_str(&entity);
                }
            }
            other => out.push(other),
        }
    }

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
