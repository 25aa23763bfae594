use std::path::PathBuf;

use chrono::Duration;

use crate::cli::Cli;
use crate::http::RequestPolicy;

/// Runtime settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub player_bin: PathBuf,
    pub revalidate_after: Duration,
    pub listing_limit: usize,
    pub use_cache: bool,
    pub request_policy: RequestPolicy,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_url: cli.api_url.trim().to_string(),
            player_bin: cli.player_bin.clone(),
            revalidate_after: Duration::hours(i64::from(cli.revalidate_hours)),
            listing_limit: cli.limit.max(1),
            use_cache: !cli.no_cache,
            request_policy: RequestPolicy::default(),
        }
    }
}
