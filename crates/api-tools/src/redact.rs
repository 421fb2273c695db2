//! Keeping credentials out of logs and error messages.
//!
//! The API key travels as a query parameter, so any URL that reaches a log line or an
//! envelope is stripped of its query first.

use url::Url;

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Render a `reqwest` error with any embedded URL redacted.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    describe_reqwest_failure(e).map_or(msg.clone(), |kind| format!("{kind}: {msg}"))
}

fn describe_reqwest_failure(e: &reqwest::Error) -> Option<&'static str> {
    if e.is_timeout() {
        Some("timed out")
    } else if e.is_connect() {
        Some("connection failed")
    } else if e.is_body() || e.is_decode() {
        Some("failed to read response body")
    } else {
        None
    }
}

/// Header names whose values must never be printed.
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case("x-store-token")
}
