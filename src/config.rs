//! src/config.rs
//!
//! Defines the strongly-typed `Config` struct for all runtime parameters,
//! loaded from files and environment variables via `figment`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Top-level struct holding all application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub device_url: String,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    pub reconnect_max_retries: Option<u32>,
    pub transition_timeout_ms: Option<u64>,
    pub setting_key: String,
    pub setting_value: String,
    pub project_prefix: String,
    pub console: Option<ConsoleConfig>,
}

/// Configuration for the optional console bridge (HTTP + WebSocket for the UI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Loads configuration from `console.toml` and environment variables.
    /// It uses the `Default` implementation as a base layer.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("console.toml"))
            .merge(Env::prefixed("CONSOLE_"))
            .extract()
    }

    pub fn transition_timeout(&self) -> Option<Duration> {
        self.transition_timeout_ms.map(Duration::from_millis)
    }

    /// A fresh project name of the form `<prefix>-<unix seconds>`.
    pub fn default_project_name(&self) -> String {
        project_name(&self.project_prefix)
    }
}

/// `<prefix>-<unix seconds>`, the name offered when the operator gives none.
pub fn project_name(prefix: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{prefix}-{secs}")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_url: "ws://127.0.0.1:9999".to_string(),
            reconnect_initial_ms: 1000,
            reconnect_max_ms: 30_000,
            reconnect_max_retries: None,
            transition_timeout_ms: Some(10_000),
            setting_key: "mac".to_string(),
            setting_value: "DF:EF:DB:F6:20:16".to_string(),
            project_prefix: "project".to_string(),
            console: Some(ConsoleConfig {
                bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080),
            }),
        }
    }
}
