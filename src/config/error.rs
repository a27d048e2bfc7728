//! Errors raised while loading or validating `deskrelay.toml`.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be used.
///
/// None of these are raised by the relay itself; they stop a command before
/// any connection is attempted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    /// An explicit `--config` path that does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid TOML in config file: {0}")]
    Parse(String),

    /// `field` is the dotted key, e.g. `relay.ping_interval_seconds`
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
