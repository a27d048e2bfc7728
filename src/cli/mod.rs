//! CLI module for deskrelay
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Follow live desk and reservation changes
//! - `desks` - List desks and their status
//! - `reservations` - List your reservations
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Follow the office with a token from the environment
//! DESKRELAY_TOKEN=... deskrelay watch
//!
//! # Free desks tomorrow morning
//! deskrelay desks --available-on 2026-03-03 --from 09:00 --to 12:00
//!
//! # Generate shell completions
//! deskrelay completions bash > ~/.bash_completion.d/deskrelay
//! ```

pub mod completions;
pub mod config;
pub mod desks;
pub mod output;
pub mod reservations;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::cache::DeskStatus;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// deskrelay - live office desk status
#[derive(Parser, Debug)]
#[command(
    name = "deskrelay",
    version,
    about = "Realtime desk and reservation status for the office booking service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow live desk and reservation changes
    Watch(WatchArgs),
    /// List desks
    Desks(DesksArgs),
    /// List your reservations
    Reservations(ReservationsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where to find the office server, shared by every networked command.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "deskrelay.toml")]
    pub config: PathBuf,

    /// Override REST API base URL
    #[arg(long, env = "DESKRELAY_API_URL")]
    pub api_url: Option<String>,

    /// Override push channel base URL
    #[arg(long, env = "DESKRELAY_WS_URL")]
    pub ws_url: Option<String>,

    /// Session token
    #[arg(short, long, env = "DESKRELAY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DESKRELAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable periodic REST refresh
    #[arg(long)]
    pub no_refresh: bool,

    /// Print notices as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DesksArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Filter by status (available, occupied, maintenance, reserved)
    #[arg(short, long)]
    pub status: Option<DeskStatus>,

    /// Only desks free on this date (YYYY-MM-DD)
    #[arg(long)]
    pub available_on: Option<NaiveDate>,

    /// Start of the window on --available-on (HH:MM)
    #[arg(long, value_parser = parse_time, requires = "available_on")]
    pub from: Option<NaiveTime>,

    /// End of the window on --available-on (HH:MM)
    #[arg(long, value_parser = parse_time, requires = "available_on")]
    pub to: Option<NaiveTime>,
}

#[derive(Args, Debug)]
pub struct ReservationsArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Only reservations that have not started yet
    #[arg(long, conflicts_with = "current")]
    pub upcoming: bool,

    /// Only the reservation in progress right now
    #[arg(long)]
    pub current: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "deskrelay.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("Invalid time '{}', expected HH:MM", s))
}
