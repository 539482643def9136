//! Tracing setup.
//!
//! Log lines go to a daily-rolled file so they never interleave with chat
//! output on the terminal.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
pub use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "STATSCOUT_LOG";

const LOG_FILE_PREFIX: &str = "statscout.log";

/// Builds the filter from STATSCOUT_LOG, falling back to `default_filter`.
pub fn env_filter(env_value: Option<&str>, default_filter: &str) -> Result<EnvFilter> {
    if let Some(directives) = env_value.map(str::trim).filter(|d| !d.is_empty()) {
        return EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid {LOG_ENV} filter: {directives}"));
    }
    EnvFilter::try_new(default_filter)
        .with_context(|| format!("Invalid log_filter: {default_filter}"))
}

/// Installs the global subscriber writing to `log_dir`.
///
/// The returned guard flushes buffered lines on drop; hold it for the life of
/// the process.
pub fn init(log_dir: &Path, default_filter: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let env_value = std::env::var(LOG_ENV).ok();
    let filter = env_filter(env_value.as_deref(), default_filter)?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(path = %log_dir.display(), "Logging initialized");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_env_filter_prefers_env_value() {
        let filter = env_filter(Some("statscout_core=trace"), "info").unwrap();
        assert_eq!(filter.to_string(), "statscout_core=trace");
    }

    #[test]
    fn test_env_filter_blank_env_uses_default() {
        let filter = env_filter(Some("  "), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_init_writes_to_log_dir() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init(&log_dir, "info").unwrap();
        tracing::info!("match list refreshed");
        drop(guard);

        let contents: String = fs::read_dir(&log_dir)
            .unwrap()
            .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        assert!(contents.contains("match list refreshed"));
    }
}
