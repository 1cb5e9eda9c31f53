use clap::{Parser, Subcommand};
use eyre::Result;

use crate::{config::Config, speech::Emotion};

mod config;
mod manual;

#[derive(Parser)]
#[command(version, about)]
pub struct CliOpts {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, default_value = "storyrover.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the command API
    Serve {
        /// Overrides the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the resolved configuration
    Config,

    /// Drive the robot to a zone and wait for it to arrive
    Move {
        /// A zone, or a story choice: spend, save or invest
        zone: String,
    },

    /// Synthesise and play a line of speech
    Say {
        text: String,
        #[arg(short, long, default_value_t = Emotion::Neutral)]
        emotion: Emotion,
    },
}

#[tokio::main]
pub async fn execute(opts: CliOpts) -> Result<()> {
    let mut config = Config::load(&opts.config).await?;

    match opts.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }

            crate::server::launch(config).await
        }

        Command::Config => self::config::print(&config),
        Command::Move { zone } => self::manual::move_to_zone(&config, &zone).await,
        Command::Say { text, emotion } => self::manual::say(&config, &text, emotion).await,
    }
}
