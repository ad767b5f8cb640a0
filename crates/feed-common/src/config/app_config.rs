//! Application configuration structs
//!
//! Loads configuration from environment variables (with an optional .env
//! file for development).

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ApiConfig,
    pub feed: FeedConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// REST collaborator client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the collaborator REST API
    pub base_url: String,
    /// Per-request timeout in milliseconds; a timeout behaves exactly like
    /// any other remote failure
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

/// Real-time feed subscription configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket URL of the entity-update feed
    pub ws_url: String,
    /// Buffer size of the update broadcast channel
    #[serde(default = "default_feed_buffer")]
    pub buffer: usize,
    /// Base reconnection delay in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

// Default value functions
fn default_app_name() -> String {
    "feed-engine".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_feed_buffer() -> usize {
    1024
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            api: ApiConfig {
                base_url: env::var("API_BASE_URL")
                    .map_err(|_| ConfigError::MissingVar("API_BASE_URL"))?,
                request_timeout_ms: env::var("API_REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_request_timeout_ms),
            },
            feed: FeedConfig {
                ws_url: env::var("FEED_WS_URL")
                    .map_err(|_| ConfigError::MissingVar("FEED_WS_URL"))?,
                buffer: env::var("FEED_BUFFER")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_feed_buffer),
                reconnect_delay_ms: env::var("FEED_RECONNECT_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_reconnect_delay_ms),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
