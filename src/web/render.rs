//! HTML pages for the web front-end

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::borrow::Cow;
use std::fmt::Write;

use crate::analyzer::{HeadingLevel, PageReport};

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <link rel="stylesheet" href="/static/css/style.css">
  <script src="/static/js/script.js" defer></script>
</head>
<body>
{body}
</body>
</html>
"#,
        title = encode_text(title),
    )
}

/// Home page with the URL form, optionally showing an error message
pub(crate) fn home_page(error: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str(r#"<div id="main-container" class="container">"#);
    body.push_str("\n  <h1>Web Page Analyzer</h1>\n");
    if let Some(message) = error.filter(|m| !m.is_empty()) {
        let _ = writeln!(body, r#"  <p class="error">{}</p>"#, encode_text(message));
    }
    body.push_str("</div>\n");
    body.push_str(
        r#"<form id="analyzeForm" class="container" action="/results" method="get" onsubmit="return showLoader()">
  <label for="url">Page URL</label>
  <input type="text" id="url" name="url" placeholder="https://example.com" autofocus>
  <button type="submit">Analyze</button>
</form>
<div id="loader" class="loader" style="display: none">Analyzing...</div>"#,
    );

    layout("Web Page Analyzer", &body)
}

/// Results page for one analyzed URL
pub(crate) fn results_page(report: &PageReport) -> String {
    let summary = &report.summary;
    let title = if summary.title.is_empty() {
        Cow::Borrowed("(none)")
    } else {
        encode_text(&summary.title)
    };

    let mut body = String::new();
    body.push_str("<div class=\"container\">\n  <h1>Analysis Results</h1>\n");
    let _ = writeln!(
        body,
        r#"  <p class="analyzed-url"><a href="{}" rel="noreferrer">{}</a></p>"#,
        encode_double_quoted_attribute(&report.url),
        encode_text(&report.url)
    );
    body.push_str("  <table class=\"summary\">\n");
    let _ = writeln!(
        body,
        "    <tr><th>HTML Version</th><td class=\"version\">{}</td></tr>",
        summary.version_display()
    );
    let _ = writeln!(body, "    <tr><th>Page Title</th><td class=\"title\">{title}</td></tr>");
    let _ = writeln!(
        body,
        "    <tr><th>Internal Links</th><td>{}</td></tr>",
        summary.internal_links
    );
    let _ = writeln!(
        body,
        "    <tr><th>External Links</th><td>{}</td></tr>",
        summary.external_links
    );
    let _ = writeln!(
        body,
        "    <tr><th>Login Form</th><td class=\"login\">{}</td></tr>",
        if summary.has_login_form { "Yes" } else { "No" }
    );
    body.push_str("  </table>\n  <h2>Headings</h2>\n  <table class=\"headings\">\n");
    for level in HeadingLevel::ALL {
        let _ = writeln!(
            body,
            "    <tr><th>{level}</th><td>{}</td></tr>",
            summary.heading_count(level)
        );
    }
    body.push_str("  </table>\n  <p><a href=\"/\">Analyze another page</a></p>\n</div>");

    layout("Analysis Results", &body)
}

pub(crate) fn not_found_page(path: &str) -> String {
    let body = format!(
        "<div class=\"container\">\n  <h1>Not Found</h1>\n  <p>No page at <code>{}</code>.</p>\n  <p><a href=\"/\">Back to the analyzer</a></p>\n</div>",
        encode_text(path)
    );
    layout("Not Found", &body)
}
