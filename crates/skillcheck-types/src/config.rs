//! Global configuration types.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! validation limits, the API server bind address, and the remote endpoint.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.skillcheck/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Maximum length (in characters) of a check's notes.
    #[serde(default = "default_max_notes_length")]
    pub max_notes_length: usize,

    /// REST API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote endpoint used by the CLI when `--remote` is not given.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

fn default_max_notes_length() -> usize {
    1000
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            max_notes_length: default_max_notes_length(),
            server: ServerConfig::default(),
            remote: None,
        }
    }
}

/// Bind address for `skc serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3210
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// A remote REST API to hydrate from and save to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL, e.g. `http://127.0.0.1:3210`.
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.max_notes_length, 1000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3210);
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_notes_length, 1000);
        assert_eq!(config.server.port, 3210);
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
max_notes_length = 250

[server]
port = 8080

[remote]
url = "http://assess.internal:3210"
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_notes_length, 250);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "http://assess.internal:3210");
        assert_eq!(remote.timeout_secs, 30);
    }
}
