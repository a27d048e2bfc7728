//! Office server endpoints

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the office server lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8000`
    pub api_url: String,
    /// Base URL of the push channel, e.g. `ws://localhost:8000`
    pub ws_url: String,
    /// Session token. Prefer `DESKRELAY_TOKEN` over storing it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub request_timeout_seconds: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            ws_url: "ws://localhost:8000".to_string(),
            token: None,
            request_timeout_seconds: 10,
        }
    }
}
