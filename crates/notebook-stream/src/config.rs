//! Client configuration with TOML support

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Streaming client configuration
///
/// Can be loaded from TOML, JSON, or constructed with [`ClientConfig::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection settings
    pub connection: ConnectionConfig,

    /// Endpoint paths
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the notebook server
    pub base_url: String,
}

/// Endpoint paths, resolved against the base URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Chat stream endpoint
    #[serde(default = "default_chat_path")]
    pub chat: String,

    /// Content generation stream endpoint
    #[serde(default = "default_content_stream_path")]
    pub content_stream: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            chat: default_chat_path(),
            content_stream: default_content_stream_path(),
        }
    }
}

fn default_chat_path() -> String {
    "/api/v1/chat/".to_string()
}

fn default_content_stream_path() -> String {
    "/api/v1/content/stream/".to_string()
}

/// Timeout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Total time allowed for one request including its streamed body.
    /// 0 disables the limit.
    #[serde(default = "default_request_ms")]
    pub request_ms: u64,

    /// Time allowed to establish the connection
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_ms: default_request_ms(),
            connect_ms: default_connect_ms(),
        }
    }
}

fn default_request_ms() -> u64 {
    360_000
}

fn default_connect_ms() -> u64 {
    10_000
}

impl TimeoutsConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_ms > 0).then(|| Duration::from_millis(self.request_ms))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Create a builder for programmatic construction
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }
}

/// Builder for [`ClientConfig`]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default endpoints and timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                connection: ConnectionConfig {
                    base_url: base_url.into(),
                },
                endpoints: EndpointsConfig::default(),
                timeouts: TimeoutsConfig::default(),
            },
        }
    }

    /// Set the chat stream path
    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoints.chat = path.into();
        self
    }

    /// Set the content generation stream path
    pub fn content_stream_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoints.content_stream = path.into();
        self
    }

    /// Set request timeout in milliseconds (0 disables it)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    /// Set connect timeout in milliseconds
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
