//! Error types for the web-analyzer crate

use thiserror::Error;

/// Result type for web-analyzer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for web-analyzer operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Page fetching error
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Web server error
    #[error("Web server error: {0}")]
    Web(String),
}
