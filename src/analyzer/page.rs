//! Single-pass page analysis

use encoding_rs::{Encoding, UTF_8};
use std::io::Read;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::analyzer::tokens::{HtmlTokens, StartTag, Token};
use crate::analyzer::version::detect_version;
use crate::analyzer::{HeadingLevel, PageSummary};

/// Where an anchor's `href` points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Relative or same-site reference
    Internal,
    /// Absolute `http(s)` or protocol-relative reference
    External,
}

/// Classify a raw `href` value.
///
/// Only the literal prefix is inspected: `http` (which covers `https`) and `//` are
/// external, everything else, including `mailto:` and fragments, is internal.
pub fn classify_link(href: &str) -> LinkKind {
    if href.starts_with("http") || href.starts_with("//") {
        LinkKind::External
    } else {
        LinkKind::Internal
    }
}

/// Analyze an HTML document in one forward pass.
///
/// The reader is consumed and dropped before returning. Read errors end the pass
/// early and whatever was counted up to that point is returned; this function never
/// fails. `base_url` is only used to resolve internal links for logging.
///
/// # Arguments
///
/// * `reader` - Source of the document bytes
/// * `base_url` - Absolute URL the document was fetched from
///
/// # Returns
///
/// The summary of the document
pub fn analyze<R: Read>(reader: R, base_url: &Url) -> PageSummary {
    analyze_with_encoding(reader, base_url, UTF_8)
}

/// Analyze a document whose bytes are in `encoding` rather than UTF-8.
///
/// A byte order mark at the start of the document takes precedence over `encoding`.
#[instrument(skip_all, fields(base_url = %base_url, encoding = encoding.name()))]
pub fn analyze_with_encoding<R: Read>(
    reader: R,
    base_url: &Url,
    encoding: &'static Encoding,
) -> PageSummary {
    let mut summary = PageSummary::default();
    let mut in_title = false;

    for token in HtmlTokens::with_encoding(reader, encoding) {
        match &token {
            Token::Doctype(_) => {
                let version = detect_version(&token);
                debug!(%version, "detected HTML version");
                summary.html_version = Some(version);
            }
            Token::StartTag(tag) => match tag.name.as_str() {
                "title" => in_title = true,
                "a" => count_links(&mut summary, tag, base_url),
                "input" => {
                    if tag.attr_values("type").any(|value| value == "password") {
                        debug!("detected a login form");
                        summary.has_login_form = true;
                    }
                }
                name => {
                    if let Some(level) = HeadingLevel::from_tag_name(name) {
                        *summary.headings.entry(level).or_insert(0) += 1;
                    }
                }
            },
            Token::Text(text) => {
                if in_title {
                    if summary.title.is_empty() {
                        debug!(title = %text, "extracted page title");
                        summary.title = text.clone();
                    }
                    in_title = false;
                }
            }
            Token::EndTag(_) | Token::Comment(_) => {}
        }
    }

    debug!(
        internal_links = summary.internal_links,
        external_links = summary.external_links,
        has_login_form = summary.has_login_form,
        "reached end of HTML document"
    );
    summary
}

fn count_links(summary: &mut PageSummary, tag: &StartTag, base_url: &Url) {
    for href in tag.attr_values("href") {
        match classify_link(href) {
            LinkKind::External => summary.external_links += 1,
            LinkKind::Internal => {
                if let Ok(resolved) = base_url.join(href) {
                    trace!(link = %resolved, "internal link");
                }
                summary.internal_links += 1;
            }
        }
    }
}
