//! Error types for the lifecycle worker
//!
//! All errors in the application are converted to `AppError`. Fatal errors
//! (configuration, connecting, the expiry scan) propagate to the binary and
//! decide its exit code; per-candidate cleanup errors are caught and logged
//! by the batch driver instead of propagating.

use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced record does not exist
    #[error("Resource not found")]
    NotFound,

    /// Rejected input (empty username, self-follow, duplicate request, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.into())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
