use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "podcastr",
    version,
    about = "Browse podcast episodes and listen to them from the terminal"
)]
pub struct Cli {
    /// Base URL of the episode API
    #[arg(
        long,
        env = "PODCASTR_API_URL",
        default_value = "http://localhost:3333",
        global = true
    )]
    pub api_url: String,

    /// mpv binary used for playback
    #[arg(long, env = "PODCASTR_PLAYER_BIN", default_value = "mpv", global = true)]
    pub player_bin: PathBuf,

    /// Hours before a cached API response is fetched again
    #[arg(long, env = "PODCASTR_REVALIDATE", default_value_t = 24, global = true)]
    pub revalidate_hours: u32,

    /// Number of episodes in the listing
    #[arg(long, default_value_t = 12, global = true)]
    pub limit: usize,

    /// Always hit the API, never the local cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Tui,
    List,
    Show {
        id: String,
    },
    Play {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    ClearCache,
}
