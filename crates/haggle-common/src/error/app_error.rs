//! Application error types
//!
//! Process-level failures (setup, auth, transport binding). Domain failures
//! live in `haggle_core::DomainError` and are echoed as protocol frames, not
//! surfaced here.

use haggle_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Missing authentication")]
    MissingAuth,

    // Transport errors
    #[error("Failed to bind listener: {0}")]
    Bind(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
