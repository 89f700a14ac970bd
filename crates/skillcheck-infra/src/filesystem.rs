//! Data directory resolution.

use std::path::PathBuf;

/// Resolve the data directory holding `skillcheck.db` and `config.toml`.
///
/// `SKILLCHECK_DATA_DIR` wins; otherwise `~/.skillcheck`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SKILLCHECK_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".skillcheck");
    }

    // Last resort: current directory
    PathBuf::from(".skillcheck")
}

/// Create the data directory if it does not exist yet.
pub async fn ensure_data_dir() -> std::io::Result<PathBuf> {
    let dir = resolve_data_dir();
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_dir_ends_in_skillcheck() {
        // Only meaningful when the override is unset.
        if std::env::var("SKILLCHECK_DATA_DIR").is_err() {
            let dir = resolve_data_dir();
            assert!(dir.ends_with(".skillcheck"));
        }
    }
}
