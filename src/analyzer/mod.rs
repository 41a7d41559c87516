//! # Page Analysis Module
//!
//! This module turns the raw bytes of an HTML document into a small structural
//! summary in a single forward pass over the token stream. No DOM is built.
//!
//! ## Key Components
//!
//! - `HtmlTokens`: Pull-style token iterator over any `Read`, backed by html5ever
//! - `detect_version`: Maps a doctype token to an `HtmlVersion`
//! - `analyze`: Walks the tokens and fills in a `PageSummary`
//!
//! ## Behaviour
//!
//! - Analysis never fails; malformed markup and read errors end the walk early
//!   and the counters gathered so far are returned
//! - Only the first `<title>` text is kept
//! - Links starting with `http` or `//` count as external, everything else as internal

mod page;
mod tokens;
mod version;

pub use page::{LinkKind, analyze, analyze_with_encoding, classify_link};
pub use tokens::{Attribute, Doctype, HtmlTokens, StartTag, Token};
pub use version::detect_version;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use url::Url;

/// Document type family detected from the `<!DOCTYPE>` declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HtmlVersion {
    /// Bare `<!DOCTYPE html>`
    #[serde(rename = "HTML5")]
    Html5,

    /// Any XHTML public or system identifier
    #[serde(rename = "XHTML")]
    Xhtml,

    /// HTML 4.01 strict, transitional or frameset
    #[serde(rename = "HTML 4.01")]
    Html401,

    /// A doctype was present but not recognised
    #[serde(rename = "Unknown")]
    Unknown,
}

impl HtmlVersion {
    /// Display label for the version
    pub fn label(&self) -> &'static str {
        match self {
            HtmlVersion::Html5 => "HTML5",
            HtmlVersion::Xhtml => "XHTML",
            HtmlVersion::Html401 => "HTML 4.01",
            HtmlVersion::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Heading element level, `h1` through `h6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// All levels in document order
    pub const ALL: [HeadingLevel; 6] = [
        HeadingLevel::H1,
        HeadingLevel::H2,
        HeadingLevel::H3,
        HeadingLevel::H4,
        HeadingLevel::H5,
        HeadingLevel::H6,
    ];

    /// Match a lower-case tag name as produced by the tokenizer
    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "h1" => Some(HeadingLevel::H1),
            "h2" => Some(HeadingLevel::H2),
            "h3" => Some(HeadingLevel::H3),
            "h4" => Some(HeadingLevel::H4),
            "h5" => Some(HeadingLevel::H5),
            "h6" => Some(HeadingLevel::H6),
            _ => None,
        }
    }

    /// Tag name of the level
    pub fn tag_name(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// Structural summary of a single HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Version from the doctype, `None` when the document has no doctype
    pub html_version: Option<HtmlVersion>,

    /// Text of the first `<title>` element, empty when there is none
    pub title: String,

    /// Number of heading start tags per level; missing levels are zero
    pub headings: BTreeMap<HeadingLevel, usize>,

    /// Number of `href` attributes on `<a>` tags classified as internal
    pub internal_links: usize,

    /// Number of `href` attributes on `<a>` tags classified as external
    pub external_links: usize,

    /// Whether a password input was seen
    pub has_login_form: bool,
}

impl PageSummary {
    /// Count for one heading level
    pub fn heading_count(&self, level: HeadingLevel) -> usize {
        self.headings.get(&level).copied().unwrap_or(0)
    }

    /// Total number of links seen
    pub fn total_links(&self) -> usize {
        self.internal_links + self.external_links
    }

    /// Version label, empty when no doctype was seen
    pub fn version_label(&self) -> &'static str {
        self.html_version.map(|v| v.label()).unwrap_or("")
    }

    /// Version label for display, with a placeholder when no doctype was seen
    pub fn version_display(&self) -> &'static str {
        match self.version_label() {
            "" => "(no doctype)",
            label => label,
        }
    }
}

/// A summary together with the page it describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    /// URL the user asked for
    pub url: String,

    /// Analysis result
    #[serde(flatten)]
    pub summary: PageSummary,
}

impl PageReport {
    /// Analyze a document on disk.
    ///
    /// The file is streamed through the analyzer rather than read up front.
    /// Internal links are resolved against `base_url`.
    ///
    /// # Arguments
    ///
    /// * `path` - HTML file to analyze
    /// * `base_url` - URL the document is treated as having been served from
    ///
    /// # Returns
    ///
    /// A report labelled with the file path
    pub fn from_file(path: &Path, base_url: &Url) -> crate::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            url: path.display().to_string(),
            summary: analyze(file, base_url),
        })
    }

    /// Pretty-printed JSON form of the report
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_heading_level_round_trip() {
        for level in HeadingLevel::ALL {
            assert_eq!(HeadingLevel::from_tag_name(level.tag_name()), Some(level));
        }
        assert_eq!(HeadingLevel::from_tag_name("h7"), None);
        assert_eq!(HeadingLevel::from_tag_name("H1"), None);
    }

    #[test]
    fn test_summary_serializes_with_display_labels() {
        let mut summary = PageSummary {
            html_version: Some(HtmlVersion::Html401),
            title: "Docs".to_string(),
            internal_links: 2,
            external_links: 1,
            ..Default::default()
        };
        summary.headings.insert(HeadingLevel::H2, 3);

        assert_eq!(summary.version_display(), "HTML 4.01");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["html_version"], "HTML 4.01");
        assert_eq!(json["headings"]["h2"], 3);
        assert_eq!(json["has_login_form"], false);
    }

    #[test]
    fn test_empty_summary_helpers() {
        let summary = PageSummary::default();
        assert_eq!(summary.version_label(), "");
        assert_eq!(summary.version_display(), "(no doctype)");
        assert_eq!(summary.heading_count(HeadingLevel::H1), 0);
        assert_eq!(summary.total_links(), 0);
    }

    #[test]
    fn test_report_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(
            &path,
            r#"<!DOCTYPE html><title>On disk</title><h1>a</h1><a href="/x">x</a>"#,
        )
        .unwrap();

        let base = Url::parse("http://localhost/").unwrap();
        let report = PageReport::from_file(&path, &base).unwrap();
        assert_eq!(report.summary.title, "On disk");
        assert_eq!(report.summary.html_version, Some(HtmlVersion::Html5));
        assert_eq!(report.summary.internal_links, 1);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["title"], "On disk");
        assert_eq!(json["html_version"], "HTML5");
        assert_eq!(json["headings"]["h1"], 1);

        let missing = PageReport::from_file(&dir.path().join("absent.html"), &base);
        assert!(matches!(missing, Err(crate::Error::Io(_))));
    }
}
