#![forbid(unsafe_code)]

//! Error types.
//!
//! Nothing in the engine is fatal. Classification failures are absorbed by
//! the annotation requester and surface only as a status string; config
//! errors are reported to whoever loads the config.

use thiserror::Error;

/// Failure of one classification round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The backend could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("classification backend returned status {code}")]
    Status { code: u16 },

    /// The host dropped the request before it completed.
    #[error("classification request aborted")]
    Aborted,
}

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
