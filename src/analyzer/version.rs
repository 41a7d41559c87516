//! Doctype-based HTML version detection

use crate::analyzer::HtmlVersion;
use crate::analyzer::tokens::Token;

/// Determine the HTML version announced by a doctype token.
///
/// A bare `<!DOCTYPE html>` is HTML5. Otherwise the public and system identifiers are
/// scanned in order and the first one mentioning `xhtml` or `html 4.01` decides.
/// Anything that is not a doctype, or matches nothing, is `Unknown`.
pub fn detect_version(token: &Token) -> HtmlVersion {
    let Token::Doctype(doctype) = token else {
        return HtmlVersion::Unknown;
    };

    if doctype.name.to_lowercase() == "html" && doctype.identifiers.is_empty() {
        return HtmlVersion::Html5;
    }

    for identifier in &doctype.identifiers {
        let identifier = identifier.to_lowercase();
        if identifier.contains("xhtml") {
            return HtmlVersion::Xhtml;
        } else if identifier.contains("html 4.01") {
            return HtmlVersion::Html401;
        }
    }

    HtmlVersion::Unknown
}
