//! Configuration module for deskrelay
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`DESKRELAY_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use deskrelay::config::DeskRelayConfig;
//!
//! let config = DeskRelayConfig::default();
//! assert_eq!(config.relay.ping_interval_seconds, 30);
//!
//! let toml = r#"
//! [server]
//! ws_url = "wss://desks.example.com"
//! "#;
//! let config: DeskRelayConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.ws_url, "wss://desks.example.com");
//! ```

pub mod error;
pub mod logging;
pub mod notices;
pub mod server;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use notices::NoticeConfig;
pub use server::ServerConfig;

// Section types owned by their modules
pub use crate::relay::RelayConfig;
pub use crate::sync::RefreshConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the relay client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DeskRelayConfig {
    /// Office server endpoints and credential
    pub server: ServerConfig,
    /// Push channel probe and reconnect behaviour
    pub relay: RelayConfig,
    /// Notice queue sizing
    pub notices: NoticeConfig,
    /// Periodic REST reconciliation
    pub refresh: RefreshConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl DeskRelayConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (existing values are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DESKRELAY_API_URL") {
            self.server.api_url = url;
        }
        if let Ok(url) = std::env::var("DESKRELAY_WS_URL") {
            self.server.ws_url = url;
        }
        if let Ok(token) = std::env::var("DESKRELAY_TOKEN") {
            if !token.is_empty() {
                self.server.token = Some(token);
            }
        }

        if let Ok(interval) = std::env::var("DESKRELAY_PING_INTERVAL") {
            if let Ok(seconds) = interval.parse() {
                self.relay.ping_interval_seconds = seconds;
            }
        }
        if let Ok(refresh) = std::env::var("DESKRELAY_REFRESH") {
            self.refresh.enabled = refresh.to_lowercase() == "true";
        }

        if let Ok(level) = std::env::var("DESKRELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DESKRELAY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("server.api_url", &self.server.api_url, &["http://", "https://"])?;
        validate_url("server.ws_url", &self.server.ws_url, &["ws://", "wss://"])?;

        if self.server.request_timeout_seconds == 0 {
            return Err(invalid(
                "server.request_timeout_seconds",
                "timeout must be non-zero",
            ));
        }

        if self.relay.ping_interval_seconds == 0 {
            return Err(invalid(
                "relay.ping_interval_seconds",
                "ping interval must be non-zero",
            ));
        }
        if self.relay.reconnect_base_delay_ms == 0 {
            return Err(invalid(
                "relay.reconnect_base_delay_ms",
                "base delay must be non-zero",
            ));
        }
        if self.relay.reconnect_base_delay_ms > self.relay.reconnect_max_delay_ms {
            return Err(invalid(
                "relay.reconnect_base_delay_ms",
                "base delay cannot exceed reconnect_max_delay_ms",
            ));
        }
        if self.relay.connect_timeout_seconds == 0 {
            return Err(invalid(
                "relay.connect_timeout_seconds",
                "connect timeout must be non-zero",
            ));
        }

        if self.notices.capacity == 0 {
            return Err(invalid("notices.capacity", "capacity must be non-zero"));
        }

        if self.refresh.enabled && self.refresh.interval_seconds == 0 {
            return Err(invalid(
                "refresh.interval_seconds",
                "interval must be non-zero when refresh is enabled",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn validate_url(field: &str, url: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if url.trim().is_empty() {
        return Err(invalid(field, "URL cannot be empty"));
    }
    if !schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: format!("URL must start with one of {}", schemes.join(", ")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_defaults() {
        let config = DeskRelayConfig::default();
        assert_eq!(config.server.api_url, "http://localhost:8000");
        assert_eq!(config.relay.max_reconnect_attempts, 5);
        assert_eq!(config.notices.capacity, 50);
        assert_eq!(config.notices.default_duration_ms, 5000);
        assert_eq!(config.refresh.interval_seconds, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [relay]
        ping_interval_seconds = 15
        "#;

        let config: DeskRelayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.relay.ping_interval_seconds, 15);
        assert_eq!(config.relay.reconnect_max_delay_ms, 30_000); // Default
    }

    #[test]
    fn test_config_parse_example_file() {
        let toml = include_str!("../../deskrelay.example.toml");
        let config: DeskRelayConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, DeskRelayConfig::default());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nws_url = \"wss://office.test\"").unwrap();

        let config = DeskRelayConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.ws_url, "wss://office.test");
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = DeskRelayConfig::load(Some(Path::new("/nonexistent/deskrelay.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_parse_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[relay\nping_interval_seconds = ").unwrap();

        let result = DeskRelayConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_env_override_ws_url() {
        std::env::set_var("DESKRELAY_WS_URL", "wss://env.test");
        let config = DeskRelayConfig::default().with_env_overrides();
        std::env::remove_var("DESKRELAY_WS_URL");

        assert_eq!(config.server.ws_url, "wss://env.test");
    }

    #[test]
    fn test_config_env_override_token() {
        std::env::set_var("DESKRELAY_TOKEN", "from-env");
        let config = DeskRelayConfig::default().with_env_overrides();
        std::env::remove_var("DESKRELAY_TOKEN");

        assert_eq!(config.server.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("DESKRELAY_PING_INTERVAL", "soon");
        let config = DeskRelayConfig::default().with_env_overrides();
        std::env::remove_var("DESKRELAY_PING_INTERVAL");

        assert_eq!(config.relay.ping_interval_seconds, 30);
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let mut config = DeskRelayConfig::default();
        config.server.ws_url = String::new();

        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "server.ws_url"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_wrong_scheme() {
        let mut config = DeskRelayConfig::default();
        config.server.ws_url = "http://localhost:8000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_ping_interval() {
        let mut config = DeskRelayConfig::default();
        config.relay.ping_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_base_above_max_delay() {
        let mut config = DeskRelayConfig::default();
        config.relay.reconnect_base_delay_ms = 60_000;

        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => {
                assert_eq!(field, "relay.reconnect_base_delay_ms")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_zero_notice_capacity() {
        let mut config = DeskRelayConfig::default();
        config.notices.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_refresh_interval_allowed_when_disabled() {
        let mut config = DeskRelayConfig::default();
        config.refresh.interval_seconds = 0;
        assert!(config.validate().is_err());

        config.refresh.enabled = false;
        assert!(config.validate().is_ok());
    }
}
