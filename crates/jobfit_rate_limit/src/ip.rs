//! Client IP extraction from proxy headers.

use reqwest::header::HeaderMap;

/// Identity used for the per-IP dimension when no header names the client.
pub const UNKNOWN_IP: &str = "unknown";

/// Headers consulted in order. `x-forwarded-for` may list several hops; the
/// first entry is the original client.
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Best-effort client address for per-IP limiting.
///
/// Takes the first entry of `x-forwarded-for`, then `x-real-ip`, then
/// `cf-connecting-ip`. Falls back to [`UNKNOWN_IP`], so requests without
/// proxy headers share one per-IP window.
pub fn client_ip(headers: &HeaderMap) -> String {
    IP_HEADERS
        .iter()
        .find_map(|name| header_value(headers, name))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn header_value(headers: &HeaderMap, key: &str) -> Option<String> {
    let raw = headers.get(key)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.2, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_falls_through_header_order() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers), "198.51.100.4");

        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.1"));
        assert_eq!(client_ip(&headers), "192.0.2.1");
    }

    #[test]
    fn test_blank_header_is_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.1"));
        assert_eq!(client_ip(&headers), "192.0.2.1");
    }

    #[test]
    fn test_unknown_without_headers() {
        assert_eq!(client_ip(&HeaderMap::new()), UNKNOWN_IP);
    }
}
