use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::FerryConfig;

/// Loads the Ferry configuration from disk with env-var overrides.
pub struct ConfigLoader {
    config: FerryConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > FERRY_CONFIG env > ~/.ferry/ferry.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("FERRY_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ferry")
            .join("ferry.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> ferry_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<FerryConfig>(&raw).map_err(|e| {
                ferry_core::FerryError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            FerryConfig::default()
        };

        // Apply environment variable overrides
        let config = Self::apply_env_overrides(config);

        // Validate config — log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(ferry_core::FerryError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// The loaded config.
    pub fn get(&self) -> FerryConfig {
        self.config.clone()
    }

    /// Path the config was read from (or would have been).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (FERRY_SSE_URL, FERRY_SPREADSHEET_ID, etc.)
    fn apply_env_overrides(mut config: FerryConfig) -> FerryConfig {
        if let Ok(v) = std::env::var("FERRY_SSE_URL") {
            config.chat.sse_url = v;
        }
        if let Ok(v) = std::env::var("FERRY_SPREADSHEET_ID") {
            config.sheets.spreadsheet_id = Some(v);
        }
        if let Ok(v) = std::env::var("FERRY_NOTIFY_EMAIL") {
            config.notify.email = Some(v);
        }
        if let Ok(v) = std::env::var("FERRY_LOG_LEVEL") {
            config.logging.level = v;
        }
        // API key: env var fills in when the config file doesn't set it.
        // Config file takes priority, env is the fallback.
        if config.llm.api_key.is_none() {
            if let Ok(v) = std::env::var("GEMINI_API_KEY") {
                config.llm.api_key = Some(v);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(
            &path,
            r#"
                [chat]
                sse_url = "http://127.0.0.1:9000/sse"

                [docs]
                command = "uvx"
                args = ["workspace-mcp"]
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::load(Some(&path)).unwrap();
        let config = loader.get();
        assert_eq!(config.chat.sse_url, "http://127.0.0.1:9000/sse");
        assert_eq!(config.docs.command, "uvx");
        assert_eq!(loader.path(), path);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loader = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(loader.get().runtime.poll_interval_secs, 2);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(
            &path,
            r#"
                [docs]
                command = ""
            "#,
        )
        .unwrap();

        assert!(ConfigLoader::load(Some(&path)).is_err());
    }
}
