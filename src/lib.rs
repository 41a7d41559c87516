//! # Web Analyzer - Structural Summaries of HTML Pages
//!
//! This crate fetches a web page and reports on its structure: the HTML version
//! declared by its doctype, the first title, how many headings of each level it
//! has, how many links point inside and outside the site, and whether it contains
//! a login form.
//!
//! ## Features
//!
//! - Single-pass streaming analysis over any `std::io::Read`, no DOM built
//! - Doctype classification for HTML5, XHTML and HTML 4.01
//! - Bounded page fetching with reqwest
//! - A small web front-end served with tiny_http
//! - Async API with Tokio
//! - Structured logging with tracing
//!
//! ## Example
//!
//! ```rust,no_run
//! use web_analyzer::analyzer::analyze;
//! use url::Url;
//!
//! let html = r#"<!DOCTYPE html><title>Hello</title><h1>Hi</h1><a href="/about">About</a>"#;
//! let base = Url::parse("https://example.com/").unwrap();
//! let summary = analyze(html.as_bytes(), &base);
//!
//! assert_eq!(summary.title, "Hello");
//! assert_eq!(summary.internal_links, 1);
//! ```

mod error;

pub mod analyzer;
pub mod fetch;
pub mod web;

pub use error::{Error, Result};

/// Commonly used items
pub mod prelude {
    pub use crate::analyzer::{HeadingLevel, HtmlVersion, PageReport, PageSummary, analyze};
    pub use crate::error::{Error, Result};
    pub use crate::fetch::{FetcherConfig, PageFetcher, analyze_target, parse_target_url};
}
