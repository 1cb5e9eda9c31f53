use std::io;

use color_eyre::owo_colors::OwoColorize;
use eyre::Result;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod hardware;
pub mod misc;
pub mod server;
pub mod speech;

const DEFAULT_LOG_FILTER: &str = "storyrover=info";

/// Loads `.env`, installs the error report handler and the log subscriber.
pub fn init() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    color_eyre::install()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {e}");
        }
    }

    Ok(())
}

pub fn banner() {
    let arch = option_env!("STORYROVER_CARGO_CFG_TARGET_ARCH").unwrap_or("unknown");
    let os = option_env!("STORYROVER_CARGO_CFG_TARGET_OS").unwrap_or("unknown");

    eprintln!(
        "{} {} {}",
        "StoryRover".bold().bright_cyan(),
        env!("CARGO_PKG_VERSION").dimmed(),
        format!("({arch}-{os})").dimmed()
    );
}

pub fn cli(opts: cli::CliOpts) -> Result<()> {
    cli::execute(opts)
}
