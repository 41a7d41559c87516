//! # Fetcher Configuration Module
//!
//! This module provides configuration options for downloading pages before analysis:
//! request timeouts, a cap on how much of the body is read, and the user agent. It
//! uses a builder pattern for flexible configuration.
//!
//! ## Key Components
//!
//! - `FetcherConfig`: The configuration struct with fetch parameters
//! - `FetcherConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! The timeout and body cap are what bound an analysis: the analyzer itself runs
//! until its input ends, so the fetcher must make sure the input does end.

use std::time::Duration;

/// Default cap on the number of body bytes handed to the analyzer (5 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Configuration for the page fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Total time allowed for a request, including reading the body
    pub timeout: Duration,

    /// Time allowed to establish the connection
    pub connect_timeout: Duration,

    /// Maximum number of body bytes read; the rest is discarded
    pub max_body_bytes: usize,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: format!("web-analyzer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for FetcherConfig
#[derive(Debug, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetcherConfig::default(),
        }
    }

    /// Set the total request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.config.connect_timeout = connect_timeout;
        self
    }

    /// Set the maximum number of body bytes to read
    pub fn max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.config.max_body_bytes = max_body_bytes;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

impl FetcherConfig {
    /// Create a new builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = FetcherConfig::builder()
            .timeout(Duration::from_secs(3))
            .max_body_bytes(1024)
            .user_agent("analyzer-test/1.0")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 1024);
        assert_eq!(config.user_agent, "analyzer-test/1.0");
    }
}
