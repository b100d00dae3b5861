//! HTTP cache control module
//!
//! Clients must never reuse a stored copy while the site is being edited, so
//! every response carries the same no-cache directives. Conditional requests
//! (`If-Modified-Since`) are still honoured, which is revalidation rather
//! than reuse.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

/// Cache-Control value sent on every response
pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Legacy HTTP/1.0 equivalents of [`NO_CACHE`]
pub const PRAGMA: &str = "no-cache";
pub const EXPIRES: &str = "0";

/// Format a timestamp as an IMF-fixdate, e.g. `Mon, 19 Oct 2026 08:00:00 GMT`
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse an HTTP date header; unparseable values yield `None`
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whether a file modified at `modified` is unchanged since the client's
/// `If-Modified-Since` value (second precision)
pub fn not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_format_http_date() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(format_http_date(time), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_parse_http_date() {
        let parsed = parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap();
        assert_eq!(parsed.timestamp(), 784_111_777);
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_not_modified_since() {
        let modified = UNIX_EPOCH + Duration::from_millis(784_111_777_500);
        assert!(not_modified_since(Some("Sun, 06 Nov 1994 08:49:37 GMT"), modified));
        assert!(not_modified_since(Some("Mon, 07 Nov 1994 08:49:37 GMT"), modified));
        assert!(!not_modified_since(Some("Sat, 05 Nov 1994 08:49:37 GMT"), modified));
        assert!(!not_modified_since(Some("garbage"), modified));
        assert!(!not_modified_since(None, modified));
    }

    #[test]
    fn test_no_cache_directives() {
        for directive in ["no-store", "no-cache", "must-revalidate", "max-age=0"] {
            assert!(NO_CACHE.contains(directive));
        }
    }
}
