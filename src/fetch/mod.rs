//! # Page Fetching Module
//!
//! This module downloads a user-supplied page and hands its body to the analyzer.
//! It makes exactly one request per page: no retries, no backoff.
//!
//! ## Key Components
//!
//! - `parse_target_url`: Validates user input as an absolute http(s) URL
//! - `analyze_target`: One-call fetch and analysis for raw user input
//! - `PageFetcher`: reqwest-backed client that fetches and analyzes pages
//! - `FetcherConfig`: Timeouts, body cap and user agent
//! - `FetchError`: Everything that can go wrong before analysis starts

mod config;
mod error;

pub use config::{DEFAULT_MAX_BODY_BYTES, FetcherConfig, FetcherConfigBuilder};
pub use error::FetchError;

use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::analyzer::{PageReport, analyze_with_encoding};

/// Validate user input as an absolute `http` or `https` URL
pub fn parse_target_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::EmptyUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| FetchError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

/// Validate `raw`, then fetch and analyze the page it names.
///
/// # Arguments
///
/// * `raw` - URL as typed by the user
/// * `config` - Fetcher settings
///
/// # Returns
///
/// The report for the page, labelled with the requested URL
pub async fn analyze_target(raw: &str, config: FetcherConfig) -> crate::Result<PageReport> {
    let url = parse_target_url(raw)?;
    let fetcher = PageFetcher::new(config)?;
    Ok(fetcher.analyze_url(&url).await?)
}

/// Encoding named by the `charset` parameter of a Content-Type header value
pub fn encoding_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches('"').trim_matches('\'');
        Encoding::for_label(label.as_bytes())
    })
}

/// A downloaded page body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub url: Url,

    /// Response status
    pub status: StatusCode,

    /// Body bytes, at most `max_body_bytes` of them
    pub body: Vec<u8>,

    /// Whether the body was cut off at the configured cap
    pub truncated: bool,

    /// Character encoding from the Content-Type header, UTF-8 when absent or unknown
    pub encoding: &'static Encoding,
}

/// HTTP client for fetching pages to analyze
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    config: FetcherConfig,
}

impl PageFetcher {
    /// Create a fetcher from the given configuration
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    /// The configuration this fetcher was built with
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Download a page with a single GET request.
    ///
    /// Non-success statuses are errors. The body is read chunk by chunk and cut off
    /// at `max_body_bytes`.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        debug!("Sending GET request");
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "upstream returned an error status");
            return Err(FetchError::Status(status));
        }

        let final_url = response.url().clone();
        let encoding = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(encoding_from_content_type)
            .unwrap_or(UTF_8);
        let limit = self.config.max_body_bytes;
        let mut body = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response.chunk().await? {
            let room = limit.saturating_sub(body.len());
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                warn!(limit, "response body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        debug!(%status, bytes = body.len(), encoding = encoding.name(), "received page");
        Ok(FetchedPage {
            url: final_url,
            status,
            body,
            truncated,
            encoding,
        })
    }

    /// Fetch a page and analyze it.
    ///
    /// Links are resolved against the final URL after redirects. The analysis runs on
    /// the blocking thread pool.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn analyze_url(&self, url: &Url) -> Result<PageReport, FetchError> {
        let page = self.fetch(url).await?;
        let started = Instant::now();

        let FetchedPage {
            url: base,
            body,
            encoding,
            ..
        } = page;
        let summary = tokio::task::spawn_blocking(move || {
            analyze_with_encoding(Cursor::new(body), &base, encoding)
        })
        .await
        .map_err(|e| FetchError::Analysis(e.to_string()))?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            title = %summary.title,
            "page analyzed"
        );
        Ok(PageReport {
            url: url.to_string(),
            summary,
        })
    }
}
