//! Configuration file handling for nbstream

use anyhow::{Context, Result};
use notebook_stream::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default server URL
    pub server: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Total request timeout in milliseconds (0 disables it)
    pub request_timeout_ms: Option<u64>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("notebook-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        server: Option<&str>,
        output: Option<&str>,
        no_color: bool,
    ) -> MergedConfig {
        MergedConfig {
            server: server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            output: output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "text".to_string()),
            no_color: no_color || self.no_color.unwrap_or(false),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub output: String,
    pub no_color: bool,
    pub request_timeout_ms: Option<u64>,
}

impl MergedConfig {
    /// Client configuration for the resolved server
    pub fn client_config(&self) -> ClientConfig {
        let mut builder = ClientConfig::builder(&self.server);
        if let Some(ms) = self.request_timeout_ms {
            builder = builder.request_timeout_ms(ms);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_file() {
        let config = Config {
            server: Some("http://file:8000".into()),
            output: Some("json".into()),
            no_color: Some(true),
            request_timeout_ms: Some(1_000),
        };

        let merged = config.merge_with_args(Some("http://cli:9000"), None, false);

        assert_eq!(merged.server, "http://cli:9000");
        assert_eq!(merged.output, "json");
        assert!(merged.no_color);
        assert_eq!(merged.client_config().timeouts.request_ms, 1_000);
    }

    #[test]
    fn test_defaults() {
        let merged = Config::default().merge_with_args(None, None, false);

        assert_eq!(merged.server, DEFAULT_SERVER);
        assert_eq!(merged.output, "text");
        assert!(!merged.no_color);
        assert_eq!(
            merged.client_config().timeouts,
            ClientConfig::builder(DEFAULT_SERVER).build().timeouts
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = \"http://notebooks:8000\"\nrequest_timeout_ms = 0\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.server.as_deref(), Some("http://notebooks:8000"));
        assert_eq!(config.request_timeout_ms, Some(0));
        assert!(config.output.is_none());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
