//! services/api/src/error.rs
//!
//! Errors that stop the server from starting or keep it from serving.
//! Per-request failures are `web::error::HttpError`.

use crate::config::ConfigError;
use recipe_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting to Postgres or applying migrations failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The recipe generation adapter could not be built.
    #[error("Recipe generator setup failed: {0}")]
    Generator(#[from] PortError),

    #[error("{credential} is required when AI_PROVIDER is {provider}")]
    MissingCredential {
        credential: &'static str,
        provider: &'static str,
    },

    #[error("CORS_ORIGIN '{0}' is not a valid header value")]
    InvalidCorsOrigin(String),

    /// Binding the listener or serving connections failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
