//! Error types for the osu! fetcher

use thiserror::Error;

/// Result type alias for fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

/// Errors that abort a collection run
///
/// Page-level and item-level failures never surface here; they are reported
/// through [`crate::client::FetchOutcome`] and degraded by the pipelines.
#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Persistence error: {0}")]
    Persistence(#[from] persistence::PersistenceError),
}

impl FetcherError {
    /// Create a new authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
