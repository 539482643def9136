//! Configuration management for StatsScout.
//!
//! Loads configuration from ${STATSCOUT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::ClientConfig;

/// Environment variable overriding the backend base URL.
pub const API_URL_ENV: &str = "STATSCOUT_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MATCH_LIST_PATH: &str = "/api/match-list";

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path helpers for StatsScout configuration and data directories.
    //!
    //! Home directory resolution:
    //! 1. STATSCOUT_HOME env var (if set)
    //! 2. ~/.config/statscout (default)

    use std::path::PathBuf;

    /// Environment variable overriding the home directory.
    pub const HOME_ENV: &str = "STATSCOUT_HOME";

    /// Returns the StatsScout home directory.
    pub fn statscout_home() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV) {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("statscout"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        statscout_home().join("config.toml")
    }

    /// Returns the path to the log directory.
    pub fn logs_dir() -> PathBuf {
        statscout_home().join("logs")
    }
}

/// StatsScout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL.
    pub api_url: String,
    /// Path of the match-list endpoint.
    pub match_list_path: String,
    /// Seconds between match-list refreshes.
    pub match_refresh_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Default tracing filter when STATSCOUT_LOG is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            match_list_path: DEFAULT_MATCH_LIST_PATH.to_string(),
            match_refresh_secs: 300,
            connect_timeout_secs: 10,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Resolves the backend base URL.
    ///
    /// Precedence: `cli_override`, then STATSCOUT_API_URL, then the config file.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> Result<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        resolve_api_url_from(cli_override, env_url.as_deref(), &self.api_url)
    }

    pub fn match_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.match_refresh_secs)
    }

    /// Builds the HTTP client configuration.
    pub fn client_config(&self, cli_override: Option<&str>) -> Result<ClientConfig> {
        Ok(ClientConfig {
            base_url: self.resolve_api_url(cli_override)?,
            match_list_path: normalize_path(&self.match_list_path),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        })
    }
}

/// Picks the first non-blank candidate, validates it, and trims a trailing `/`.
fn resolve_api_url_from(
    cli_url: Option<&str>,
    env_url: Option<&str>,
    config_url: &str,
) -> Result<String> {
    let (source, raw) = [
        ("--api-url", cli_url),
        (API_URL_ENV, env_url),
        ("config api_url", Some(config_url)),
    ]
    .into_iter()
    .find_map(|(source, url)| {
        url.map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| (source, url))
    })
    .unwrap_or(("default", DEFAULT_API_URL));

    url::Url::parse(raw).with_context(|| format!("Invalid backend URL from {source}: {raw}"))?;
    Ok(raw.trim_end_matches('/').to_string())
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        DEFAULT_MATCH_LIST_PATH.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
