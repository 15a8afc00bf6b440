//! services/app/src/error.rs
//!
//! Defines the primary error type for the client application.

use crate::config::ConfigError;
use dream_path_core::{GenerationError, PortError};

/// The primary error type for the `app` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{0}")]
    Port(#[from] PortError),

    /// A generation request ended in failure.
    #[error("{0}")]
    Generation(#[from] GenerationError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while applying the database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., reading an uploaded file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sign-in problems and commands that need a signed-in user.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;
