//! Logging setup using the tracing ecosystem.
//!
//! The engine itself only emits `tracing` events; embedding applications
//! that do not install their own subscriber can call [`init_logging`].

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ClientConfig, LOG_ENV_VAR};
use crate::error::{ClientError, Result};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive (e.g. "info", "uptown_client=debug")
    pub filter: String,
    /// Include file/line in logs
    pub file_line: bool,
    /// Include the event target
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "info".into()),
            file_line: false,
            target: true,
        }
    }
}

impl LogConfig {
    /// Settings for a loaded client config. `UPTOWN_LOG` wins over the
    /// file's `log_filter`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            filter: resolve_filter(std::env::var(LOG_ENV_VAR).ok(), &config.log_filter),
            ..Self::default()
        }
    }

    /// Verbose config for development.
    pub fn development() -> Self {
        Self {
            filter: "debug".into(),
            file_line: true,
            target: true,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

impl From<&ClientConfig> for LogConfig {
    fn from(config: &ClientConfig) -> Self {
        Self::from_config(config)
    }
}

fn resolve_filter(env: Option<String>, configured: &str) -> String {
    match env {
        Some(filter) if !filter.trim().is_empty() => filter,
        _ => configured.to_string(),
    }
}

/// Install a global fmt subscriber.
///
/// Fails if the filter does not parse or a subscriber is already set.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| ClientError::Config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(config.target)
        .with_file(config.file_line)
        .with_line_number(config.file_line);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ClientError::Config(format!("Failed to install subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.filter, "debug");
        assert!(config.file_line);
    }

    #[test]
    fn test_configured_filter_used() {
        let config = ClientConfig::new("wss://example.test/default").with_log_filter("trace");
        assert_eq!(resolve_filter(None, &config.log_filter), "trace");
        assert_eq!(resolve_filter(Some(" ".into()), &config.log_filter), "trace");

        if std::env::var(LOG_ENV_VAR).is_err() {
            assert_eq!(LogConfig::from(&config).filter, "trace");
        }
    }

    #[test]
    fn test_env_filter_overrides_config() {
        assert_eq!(
            resolve_filter(Some("uptown_client=debug".into()), "trace"),
            "uptown_client=debug"
        );
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let config = LogConfig::default().with_filter("uptown_client=notalevel");
        assert!(matches!(init_logging(config), Err(ClientError::Config(_))));
    }
}
