//! Unified error type for the crate.
//!
//! Expected denial outcomes (bad token, denied origin, unsatisfied
//! permission) are values, not errors; these variants cover configuration,
//! store, and upstream failures only.

use crate::permissions::PermissionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZonegateError {
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream DNS API error: {0}")]
    Upstream(String),
}

impl From<serde_json::Error> for ZonegateError {
    fn from(error: serde_json::Error) -> Self {
        ZonegateError::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for ZonegateError {
    fn from(error: toml::de::Error) -> Self {
        ZonegateError::Config(error.to_string())
    }
}

/// Result type alias for operations that can fail with a `ZonegateError`.
pub type ZonegateResult<T> = Result<T, ZonegateError>;
