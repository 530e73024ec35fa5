//! Configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.doppel/` in production)
//! and deserializes it into [`DoppelConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use doppel_types::config::DoppelConfig;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`DoppelConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_config(data_dir: &Path) -> DoppelConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return DoppelConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return DoppelConfig::default();
        }
    };

    match toml::from_str::<DoppelConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            DoppelConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.models.fast, "gemini-2.5-flash");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[models]
fast = "gemini-x-mini"

[retry]
max_attempts = 5

[media]
poll_interval_secs = 3
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.models.fast, "gemini-x-mini");
        // Unspecified fields keep their defaults
        assert_eq!(config.models.reasoning, "gemini-2.5-pro");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.media.poll_interval_secs, 3);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn load_config_empty_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "").await.unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.models.live, DoppelConfig::default().models.live);
        assert_eq!(config.media.timeout_secs, 600);
    }
}
