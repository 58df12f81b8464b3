//! HTTP cache control module
//!
//! Provides `ETag` / `Last-Modified` generation and conditional request handling.

use hyper::header::{
    HeaderMap, CACHE_CONTROL, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    IF_UNMODIFIED_SINCE, LAST_MODIFIED,
};
use std::fs::Metadata;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Longest `max-age` ever emitted (one year)
pub const MAX_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Generate a weak `ETag` from file size and modification time
///
/// # Returns
/// Weak `ETag` string, e.g., `W/"1a2b-18c0d2f4e10"`
pub fn generate_etag(metadata: &Metadata) -> String {
    let mtime_ms = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis());
    format!("W/\"{:x}-{mtime_ms:x}\"", metadata.len())
}

/// `Last-Modified` value (IMF-fixdate), `None` if the platform has no mtime
pub fn last_modified(metadata: &Metadata) -> Option<String> {
    metadata.modified().ok().map(httpdate::fmt_http_date)
}

/// `Cache-Control` value for the given max-age
pub fn cache_control(max_age: Duration, immutable: bool) -> String {
    let secs = max_age.min(MAX_MAX_AGE).as_secs();
    if immutable {
        format!("public, max-age={secs}, immutable")
    } else {
        format!("public, max-age={secs}")
    }
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// Comparison is weak: a `W/` prefix on either side is ignored.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || opaque_tag(e) == opaque_tag(etag)
        })
    })
}

/// Strip the weakness indicator
fn opaque_tag(etag: &str) -> &str {
    etag.strip_prefix("W/").unwrap_or(etag)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &hyper::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_date(value: &str) -> Option<SystemTime> {
    httpdate::parse_http_date(value).ok()
}

/// Whether the request is a conditional GET (any of the four `If-*` headers)
pub fn is_conditional(request: &HeaderMap) -> bool {
    [IF_MATCH, IF_UNMODIFIED_SINCE, IF_NONE_MATCH, IF_MODIFIED_SINCE]
        .iter()
        .any(|name| request.contains_key(name))
}

/// `If-Match` / `If-Unmodified-Since` evaluation, true means 412
pub fn is_precondition_failure(request: &HeaderMap, response: &HeaderMap) -> bool {
    if let Some(if_match) = header_str(request, &IF_MATCH) {
        let etag = header_str(response, &ETAG);
        let matched = if_match.trim() == "*"
            || etag.is_some_and(|etag| {
                if_match
                    .split(',')
                    .map(str::trim)
                    .any(|tag| tag == etag || format!("W/{tag}") == etag)
            });
        return !matched;
    }

    if let Some(since) = header_str(request, &IF_UNMODIFIED_SINCE).and_then(parse_date) {
        if let Some(modified) = header_str(response, &LAST_MODIFIED).and_then(parse_date) {
            return modified > since;
        }
    }

    false
}

/// Whether the client's cached copy is still fresh (304)
pub fn is_fresh(request: &HeaderMap, response: &HeaderMap) -> bool {
    let if_none_match = header_str(request, &IF_NONE_MATCH);
    let if_modified_since = header_str(request, &IF_MODIFIED_SINCE);

    if if_none_match.is_none() && if_modified_since.is_none() {
        return false;
    }

    // end-to-end reload
    if header_str(request, &CACHE_CONTROL).is_some_and(|cc| {
        cc.split(',')
            .any(|d| d.trim().eq_ignore_ascii_case("no-cache"))
    }) {
        return false;
    }

    if let Some(if_none_match) = if_none_match {
        if if_none_match.trim() != "*" {
            let Some(etag) = header_str(response, &ETAG) else {
                return false;
            };
            if !check_etag_match(Some(if_none_match), etag) {
                return false;
            }
        }
    }

    if let Some(since) = if_modified_since {
        let modified = header_str(response, &LAST_MODIFIED).and_then(parse_date);
        match (modified, parse_date(since)) {
            (Some(modified), Some(since)) if modified <= since => {}
            _ => return false,
        }
    }

    true
}
