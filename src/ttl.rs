//! Expiration policy for stored responses

use axum::http::{HeaderMap, header::CACHE_CONTROL};

/// TTL in seconds for a completed response: the first `max-age=<digits>`
/// in its Cache-Control header, or `default_ttl` when there is none.
///
/// Directive matching ignores case, so `Max-Age=60` yields 60. A value
/// that does not fit in a `u64` falls back to `default_ttl`. `max-age=0`
/// yields 0, which expires the entry immediately.
pub fn resolve_ttl(headers: &HeaderMap, default_ttl: u64) -> u64 {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(max_age)
        .unwrap_or(default_ttl)
}

/// Extract `max-age` seconds from a Cache-Control value
pub fn max_age(cache_control: &str) -> Option<u64> {
    let lower = cache_control.to_ascii_lowercase();

    lower.match_indices("max-age=").find_map(|(idx, directive)| {
        let rest = &lower[idx + directive.len()..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        rest[..digits].parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(CACHE_CONTROL, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn max_age_wins_over_default() {
        assert_eq!(resolve_ttl(&headers(&["max-age=120"]), 3600), 120);
        assert_eq!(resolve_ttl(&headers(&["public, max-age=60, must-revalidate"]), 3600), 60);
    }

    #[test]
    fn missing_header_uses_default() {
        assert_eq!(resolve_ttl(&HeaderMap::new(), 3600), 3600);
        assert_eq!(resolve_ttl(&headers(&["no-cache"]), 10), 10);
    }

    #[test]
    fn malformed_directives_fall_back() {
        assert_eq!(resolve_ttl(&headers(&["max-age="]), 10), 10);
        assert_eq!(resolve_ttl(&headers(&["max-age=abc"]), 10), 10);
        assert_eq!(resolve_ttl(&headers(&["max-age=99999999999999999999999"]), 10), 10);
    }

    #[test]
    fn trailing_garbage_after_digits_is_ignored() {
        assert_eq!(max_age("max-age=30s"), Some(30));
    }

    #[test]
    fn case_insensitive_and_s_maxage_ignored() {
        assert_eq!(max_age("Max-Age=45"), Some(45));
        assert_eq!(max_age("s-maxage=45"), None);
    }

    #[test]
    fn zero_is_kept() {
        assert_eq!(resolve_ttl(&headers(&["max-age=0"]), 3600), 0);
    }

    #[test]
    fn later_header_line_is_consulted() {
        assert_eq!(resolve_ttl(&headers(&["public", "max-age=15"]), 3600), 15);
    }
}
