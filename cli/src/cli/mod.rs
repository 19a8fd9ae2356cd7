pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lead-relay")]
#[command(author, version, about = "Relay website chat to a completion API and leads to Telegram")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/lead-relay/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Start {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show effective configuration and probe a running server
    Status,

    /// Validate configuration and exit
    CheckConfig,
}
