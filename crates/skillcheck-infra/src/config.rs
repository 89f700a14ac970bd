//! Global configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.skillcheck/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use skillcheck_types::config::GlobalConfig;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - A `max_notes_length` of zero is treated as unset.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(mut config) => {
            if config.max_notes_length == 0 {
                config.max_notes_length = GlobalConfig::default().max_notes_length;
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_notes_length, 1000);
        assert_eq!(config.server.port, 3210);
        assert!(config.remote.is_none());
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
max_notes_length = 280

[server]
host = "0.0.0.0"
port = 8080

[remote]
url = "http://checks.internal:3210"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_notes_length, 280);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "http://checks.internal:3210");
        assert_eq!(remote.timeout_secs, 30);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "max_notes_length = \"lots\"")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_notes_length, 1000);
    }

    #[tokio::test]
    async fn load_global_config_zero_notes_limit_falls_back() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "max_notes_length = 0")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_notes_length, 1000);
    }
}
