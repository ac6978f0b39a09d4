//! Small HTTP helpers shared by the service clients.

use reqwest::StatusCode;

/// Maximum number of characters kept from an error body.
pub const SNIPPET_CHARS: usize = 240;

/// Returns a short, single-line prefix of a response body for error messages.
pub fn make_snippet(body: &str) -> String {
    body.chars()
        .take(SNIPPET_CHARS)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Joins a base URL and an absolute path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Reads the body of a failed response and returns `(status, snippet)`.
///
/// Body read errors degrade to an empty snippet: the status is what matters.
pub async fn status_and_snippet(resp: reqwest::Response) -> (StatusCode, String) {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    (status, make_snippet(&text))
}
