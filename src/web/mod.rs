//! # Web Front-End Module
//!
//! This module serves the small web UI: a home page with a URL form, a results page
//! for a single analysis, and static assets.
//!
//! ## Key Components
//!
//! - `WebConfig`: Listen address, asset directories and fetcher settings
//! - `Router`: Maps a request to a reply; independent of the HTTP server
//! - `WebServer`: tiny_http accept loop that dispatches requests onto tokio
//!
//! ## Routes
//!
//! - `/`: home page, shows the `error` query parameter when present
//! - `/results?url=...`: fetch and analyze a page (GET only)
//! - `/static/...` and `/images/...`: files from the configured directories
//!
//! Every failure on `/results` redirects back to `/` with a readable `error`
//! parameter instead of rendering an error page.

mod render;
mod server;

pub use server::WebServer;

use reqwest::{Method, StatusCode};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::form_urlencoded;

use crate::error::Error as CrateError;
use crate::fetch::{FetchError, FetcherConfig, PageFetcher, parse_target_url};

/// Error type for the web front-end
#[derive(Debug, Error)]
pub enum WebError {
    /// The listener could not be bound
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// Requested address
        addr: String,
        /// Underlying failure
        reason: String,
    },

    /// The page fetcher could not be created
    #[error("fetcher setup failed: {0}")]
    Fetcher(#[from] FetchError),

    /// Socket error while serving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WebError> for CrateError {
    fn from(err: WebError) -> Self {
        match err {
            WebError::Io(e) => CrateError::Io(e),
            _ => CrateError::Web(err.to_string()),
        }
    }
}

/// Configuration for the web front-end
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to listen on
    pub listen_addr: String,

    /// Directory served under `/static/`
    pub static_dir: PathBuf,

    /// Directory served under `/images/`
    pub images_dir: PathBuf,

    /// Settings for fetching the pages to analyze
    pub fetcher: FetcherConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            static_dir: PathBuf::from("web/static"),
            images_dir: PathBuf::from("web/util/images"),
            fetcher: FetcherConfig::default(),
        }
    }
}

/// Builder for WebConfig
#[derive(Debug, Default)]
pub struct WebConfigBuilder {
    config: WebConfig,
}

impl WebConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Set the listen address
    pub fn listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.config.listen_addr = listen_addr.into();
        self
    }

    /// Set the directory served under `/static/`
    pub fn static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.config.static_dir = static_dir.into();
        self
    }

    /// Set the directory served under `/images/`
    pub fn images_dir(mut self, images_dir: impl Into<PathBuf>) -> Self {
        self.config.images_dir = images_dir.into();
        self
    }

    /// Set the fetcher configuration
    pub fn fetcher(mut self, fetcher: FetcherConfig) -> Self {
        self.config.fetcher = fetcher;
        self
    }

    /// Build the configuration
    pub fn build(self) -> WebConfig {
        self.config
    }
}

impl WebConfig {
    /// Create a new builder
    pub fn builder() -> WebConfigBuilder {
        WebConfigBuilder::new()
    }
}

/// An incoming request, reduced to what the router needs
#[derive(Debug, Clone)]
pub struct WebRequest {
    /// HTTP method
    pub method: Method,

    /// Request target: path plus optional query string
    pub target: String,
}

impl WebRequest {
    /// Build a GET request for `target`
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            target: target.into(),
        }
    }
}

/// What to send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebReply {
    /// Rendered HTML page
    Html {
        /// Response status
        status: StatusCode,
        /// Page markup
        body: String,
    },

    /// 303 See Other
    Redirect {
        /// Value of the `Location` header
        location: String,
    },

    /// A static file
    File {
        /// Value of the `Content-Type` header
        content_type: &'static str,
        /// File contents
        body: Vec<u8>,
    },
}

impl WebReply {
    /// Status code of the reply
    pub fn status(&self) -> StatusCode {
        match self {
            WebReply::Html { status, .. } => *status,
            WebReply::Redirect { .. } => StatusCode::SEE_OTHER,
            WebReply::File { .. } => StatusCode::OK,
        }
    }

    fn not_found(path: &str) -> Self {
        WebReply::Html {
            status: StatusCode::NOT_FOUND,
            body: render::not_found_page(path),
        }
    }

    fn home_with_error(message: &str) -> Self {
        let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
        WebReply::Redirect {
            location: format!("/?error={encoded}"),
        }
    }
}

/// Routes requests to pages; one instance is shared by every connection
#[derive(Debug, Clone)]
pub struct Router {
    fetcher: PageFetcher,
    static_dir: PathBuf,
    images_dir: PathBuf,
}

impl Router {
    /// Create a router from the given configuration
    pub fn new(config: &WebConfig) -> Result<Self, WebError> {
        Ok(Self {
            fetcher: PageFetcher::new(config.fetcher.clone())?,
            static_dir: config.static_dir.clone(),
            images_dir: config.images_dir.clone(),
        })
    }

    /// Produce the reply for a request
    #[instrument(skip_all, fields(method = %request.method, target = %request.target))]
    pub async fn handle(&self, request: &WebRequest) -> WebReply {
        let (path, query) = match request.target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (request.target.as_str(), ""),
        };

        if path == "/" {
            debug!("Rendering home page");
            let error = query_param(query, "error");
            return WebReply::Html {
                status: StatusCode::OK,
                body: render::home_page(error.as_deref()),
            };
        }
        if path == "/results" {
            return self.results(&request.method, query).await;
        }
        if let Some(rest) = path.strip_prefix("/static/") {
            return serve_file(&self.static_dir, rest, path).await;
        }
        if let Some(rest) = path.strip_prefix("/images/") {
            return serve_file(&self.images_dir, rest, path).await;
        }

        WebReply::not_found(path)
    }

    async fn results(&self, method: &Method, query: &str) -> WebReply {
        let started = Instant::now();
        info!("Received request for analysis");

        if *method != Method::GET {
            warn!(%method, "invalid request method");
            return WebReply::home_with_error("Invalid Request Method");
        }

        let raw = query_param(query, "url").unwrap_or_default();
        let url = match parse_target_url(&raw) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "rejected URL");
                return WebReply::home_with_error(&user_message(&err));
            }
        };

        match self.fetcher.analyze_url(&url).await {
            Ok(mut report) => {
                report.url = raw.trim().to_string();
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analysis completed"
                );
                WebReply::Html {
                    status: StatusCode::OK,
                    body: render::results_page(&report),
                }
            }
            Err(err) => {
                warn!(error = %err, "analysis failed");
                WebReply::home_with_error(&user_message(&err))
            }
        }
    }
}

/// Message shown to the user for a failed analysis
pub fn user_message(err: &FetchError) -> String {
    match err {
        FetchError::EmptyUrl => "Please Enter a URL".to_string(),
        FetchError::InvalidUrl { .. } => "Invalid URL Format".to_string(),
        FetchError::Network(_) => "Failed to fetch URL".to_string(),
        FetchError::Status(status) => format!("HTTP Error {}", status.as_u16()),
        FetchError::Analysis(_) => "Failed to analyze page".to_string(),
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

async fn serve_file(root: &Path, relative: &str, request_path: &str) -> WebReply {
    let Some(path) = confined_path(root, relative) else {
        warn!(path = %request_path, "rejected asset path");
        return WebReply::not_found(request_path);
    };

    match tokio::fs::read(&path).await {
        Ok(body) => WebReply::File {
            content_type: content_type_for(&path),
            body,
        },
        Err(err) => {
            debug!(path = %path.display(), error = %err, "asset not readable");
            WebReply::not_found(request_path)
        }
    }
}

/// Join `relative` onto `root`, refusing anything that could leave `root`
fn confined_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative.as_os_str().is_empty() {
        return None;
    }
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| root.join(relative))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    fn router() -> Router {
        Router::new(&WebConfig::default()).unwrap()
    }

    fn location(reply: &WebReply) -> &str {
        match reply {
            WebReply::Redirect { location } => location,
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    fn body(reply: &WebReply) -> &str {
        match reply {
            WebReply::Html { body, .. } => body,
            other => panic!("expected html, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_home_page() {
        let reply = router().handle(&WebRequest::get("/")).await;

        assert_eq!(reply.status(), StatusCode::OK);
        assert!(body(&reply).contains(r#"action="/results""#));
    }

    #[tokio::test]
    async fn test_home_page_shows_escaped_error() {
        let reply = router()
            .handle(&WebRequest::get("/?error=%3Cb%3EBad%3C%2Fb%3E+input"))
            .await;

        let page = body(&reply);
        assert!(page.contains("&lt;b&gt;Bad&lt;/b&gt; input"));
        assert!(!page.contains("<b>Bad"));
    }

    #[tokio::test]
    async fn test_results_rejects_other_methods() {
        let request = WebRequest {
            method: Method::POST,
            target: "/results".to_string(),
        };
        let reply = router().handle(&request).await;

        assert_eq!(reply.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&reply), "/?error=Invalid+Request+Method");
    }

    #[tokio::test]
    async fn test_results_without_url() {
        let reply = router().handle(&WebRequest::get("/results")).await;
        assert_eq!(location(&reply), "/?error=Please+Enter+a+URL");

        let reply = router().handle(&WebRequest::get("/results?url=")).await;
        assert_eq!(location(&reply), "/?error=Please+Enter+a+URL");
    }

    #[tokio::test]
    async fn test_results_with_invalid_url() {
        let reply = router()
            .handle(&WebRequest::get("/results?url=invalid-url"))
            .await;
        assert_eq!(location(&reply), "/?error=Invalid+URL+Format");
    }

    #[tokio::test]
    async fn test_results_with_unreachable_url() {
        let reply = router()
            .handle(&WebRequest::get("/results?url=http%3A%2F%2F127.0.0.1%3A1%2F"))
            .await;
        assert_eq!(location(&reply), "/?error=Failed+to+fetch+URL");
    }

    #[tokio::test]
    async fn test_results_with_upstream_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(500)
            .create_async()
            .await;

        let target: String = form_urlencoded::Serializer::new(String::from("/results?"))
            .append_pair("url", &server.url())
            .finish();
        let reply = router().handle(&WebRequest::get(target)).await;

        assert_eq!(location(&reply), "/?error=HTTP+Error+500");
    }

    #[tokio::test]
    async fn test_results_page() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/login")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<!DOCTYPE html><title>Sign in</title><h1>Welcome</h1><form><input type="password"></form><a href="/help">help</a>"#,
            )
            .create_async()
            .await;

        let page_url = format!("{}/login", server.url());
        let target: String = form_urlencoded::Serializer::new(String::from("/results?"))
            .append_pair("url", &page_url)
            .finish();
        let reply = router().handle(&WebRequest::get(target)).await;

        assert_eq!(reply.status(), StatusCode::OK);
        let page = body(&reply);
        assert!(page.contains("Sign in"));
        assert!(page.contains("HTML5"));
        assert!(page.contains(&page_url));
        assert!(page.contains(r#"<td class="login">Yes</td>"#));
    }

    #[tokio::test]
    async fn test_static_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/site.css"), "body { margin: 0; }").unwrap();

        let config = WebConfig::builder().static_dir(dir.path()).build();
        let router = Router::new(&config).unwrap();

        let reply = router.handle(&WebRequest::get("/static/css/site.css")).await;
        assert_eq!(
            reply,
            WebReply::File {
                content_type: "text/css; charset=utf-8",
                body: b"body { margin: 0; }".to_vec(),
            }
        );

        let missing = router.handle(&WebRequest::get("/static/css/none.css")).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let escape = router.handle(&WebRequest::get("/static/../Cargo.toml")).await;
        assert_eq!(escape.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let reply = router().handle(&WebRequest::get("/nope")).await;
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_confined_path() {
        let root = Path::new("/srv/static");
        assert_eq!(
            confined_path(root, "js/app.js"),
            Some(PathBuf::from("/srv/static/js/app.js"))
        );
        assert_eq!(confined_path(root, ""), None);
        assert_eq!(confined_path(root, "../secret"), None);
        assert_eq!(confined_path(root, "js/../../secret"), None);
        assert_eq!(confined_path(root, "/etc/passwd"), None);
    }
}
