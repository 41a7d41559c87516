//! Error types for the fetch module

use crate::error::Error as CrateError;
use reqwest::StatusCode;
use thiserror::Error;

/// Error type for fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// No URL was supplied
    #[error("no URL given")]
    EmptyUrl,

    /// The URL is not an absolute http(s) URL
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected input
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Connecting, sending, or reading the body failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP error {}", .0.as_u16())]
    Status(StatusCode),

    /// The analysis task did not complete
    #[error("analysis failed: {0}")]
    Analysis(String),
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(e) => CrateError::Http(e),
            _ => CrateError::Fetch(err.to_string()),
        }
    }
}
