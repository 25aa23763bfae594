mod episode;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::db::Database;
use crate::http::{RequestPolicy, get_text_with_retries};

pub(crate) use self::episode::{
    Episode, EpisodeError, description_text, format_duration, parse_episode, parse_episode_list,
    truncate,
};
#[cfg(test)]
pub(crate) use self::episode::format_published_at;

/// Client for the episode API. Responses go through an optional SQLite page
/// cache: bodies younger than the revalidation window are served without a
/// request, and a stale body is still served when the refresh fails.
#[derive(Clone)]
pub(crate) struct Catalog {
    base_url: String,
    policy: RequestPolicy,
    cache: Option<Arc<Mutex<Database>>>,
    revalidate_after: Duration,
}

impl Catalog {
    pub(crate) fn new(base_url: &str, policy: RequestPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
            cache: None,
            revalidate_after: Duration::hours(24),
        }
    }

    pub(crate) fn with_cache(mut self, db: Database, revalidate_after: Duration) -> Self {
        self.cache = Some(Arc::new(Mutex::new(db)));
        self.revalidate_after = revalidate_after;
        self
    }

    pub(crate) fn fetch_listing(&self, limit: usize) -> Result<Vec<Episode>> {
        let query = vec![
            ("_limit".to_string(), limit.to_string()),
            ("_sort".to_string(), "published_at".to_string()),
            ("_order".to_string(), "desc".to_string()),
        ];
        self.load("/episodes", &query, parse_episode_list)
            .context("failed to load episode listing")
    }

    pub(crate) fn fetch_episode(&self, id: &str) -> Result<Episode> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            bail!("invalid episode id '{id}'");
        }
        self.load(&format!("/episodes/{id}"), &[], parse_episode)
            .with_context(|| format!("failed to load episode {id}"))
    }

    fn load<T>(
        &self,
        path: &str,
        query: &[(String, String)],
        parse: impl Fn(&str) -> Result<T, EpisodeError>,
    ) -> Result<T> {
        let key = cache_key(path, query);
        let cached = match self.cached(&key) {
            Ok(cached) => cached,
            Err(err) => {
                warn!(key, "ignoring unreadable cache entry: {err:#}");
                None
            }
        };

        if let Some(page) = &cached
            && page.is_fresh(self.revalidate_after, Utc::now())
            && let Ok(value) = parse(&page.body)
        {
            debug!(key, "serving cached page");
            return Ok(value);
        }

        let url = format!("{}{path}", self.base_url);
        let fetched = get_text_with_retries(&url, query, &self.policy)
            .map_err(anyhow::Error::from)
            .and_then(|body| {
                let value = parse(&body)?;
                Ok((body, value))
            });

        match fetched {
            Ok((body, value)) => {
                if let Err(err) = self.remember(&key, &body) {
                    warn!(key, "failed to cache page: {err:#}");
                }
                Ok(value)
            }
            Err(err) => {
                if let Some(page) = cached
                    && let Ok(value) = parse(&page.body)
                {
                    warn!(key, "refresh failed, serving stale page: {err:#}");
                    return Ok(value);
                }
                Err(err)
            }
        }
    }

    fn cached(&self, key: &str) -> Result<Option<crate::db::CachedPage>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let db = cache.lock().map_err(|_| anyhow!("cache lock poisoned"))?;
        db.cached_page(key)
    }

    fn remember(&self, key: &str, body: &str) -> Result<()> {
        let Some(cache) = &self.cache else {
            return Ok(());
        };
        let db = cache.lock().map_err(|_| anyhow!("cache lock poisoned"))?;
        db.store_page(key, body, Utc::now())
    }
}

fn cache_key(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let pairs = query
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{pairs}")
}
