mod app;
mod catalog;
mod cli;
mod config;
mod db;
mod http;
mod logging;
mod paths;
mod player;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    if let Err(err) = logging::init(cli.verbose) {
        eprintln!("Warning: logging disabled: {err:#}");
    }
    app::run(cli)
}
