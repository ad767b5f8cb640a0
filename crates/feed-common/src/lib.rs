//! # feed-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ApiConfig, AppConfig, AppSettings, ConfigError, Environment, FeedConfig};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{init_tracing, try_init_tracing, LogFormat, TracingConfig, TracingError};
