//! Client configuration.
//!
//! Loads the server endpoint (and optionally a game to join on start) from
//! TOML. Choosing between environments is left to whoever writes the file.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "UPTOWN_LOG";

fn default_log_filter() -> String {
    "info".to_string()
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the game server
    pub endpoint: String,

    /// Game to select on start, if any
    #[serde(default, rename = "gameid")]
    pub game_id: Option<String>,

    /// tracing filter directive (e.g. "info", "uptown_client=debug")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            game_id: None,
            log_filter: default_log_filter(),
        }
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loaded client config");
        Self::from_toml_str(&content)
    }

    /// Check that the endpoint is a WebSocket URL.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| ClientError::Config(format!("invalid endpoint {:?}: {}", self.endpoint, e)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(ClientError::Config(format!(
                "endpoint scheme must be ws or wss, got {}",
                other
            ))),
        }
    }
}

/// Game id carried in a location query string.
///
/// Accepts the bare form `?mygame` as well as `?gameid=mygame`.
pub fn game_id_from_query(query: &str) -> Option<String> {
    let raw = query.strip_prefix('?').unwrap_or(query).trim();
    if raw.is_empty() {
        return None;
    }

    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if let Some((_, value)) = pairs.iter().find(|(k, v)| k == "gameid" && !v.is_empty()) {
        return Some(value.clone());
    }

    match pairs.as_slice() {
        [(bare, value)] if value.is_empty() && !raw.contains('=') => Some(bare.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            endpoint = "wss://example.test/default"
            gameid = "friday"
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            ClientConfig::new("wss://example.test/default").with_game_id("friday")
        );
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_rejects_non_websocket_endpoint() {
        let err = ClientConfig::from_toml_str(r#"endpoint = "https://example.test""#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("ws://localhost:9000").validate().is_ok());
    }

    #[test]
    fn test_missing_endpoint() {
        assert!(ClientConfig::from_toml_str(r#"gameid = "x""#).is_err());
    }

    #[test]
    fn test_game_id_from_query() {
        assert_eq!(game_id_from_query("?friday"), Some("friday".to_string()));
        assert_eq!(game_id_from_query("?gameid=friday"), Some("friday".to_string()));
        assert_eq!(game_id_from_query("?my%20game"), Some("my game".to_string()));
        assert_eq!(game_id_from_query(""), None);
        assert_eq!(game_id_from_query("?"), None);
        assert_eq!(game_id_from_query("?other=1"), None);
    }
}
