//! Path resolution.
//!
//! Turns a path-like string (`/segment/segment?key=value&key=value2`) into
//! decoded segments plus a query parameter mapping, and back again.
//!
//! # Rules
//!
//! 1. Anything after `#` is ignored.
//! 2. The query string starts at the first `?`.
//! 3. Segments are split on `/`; empty segments are dropped, so `""`, `"/"`
//!    and `"//"` all resolve to the root.
//! 4. A trailing `index` segment maps to the navigator root.
//! 5. Query keys and values are percent-decoded (`+` means space); repeated
//!    keys collapse into an ordered array.
//! 6. The only failure is undecodable percent-encoding.
//!
//! # Example
//!
//! ```
//! use navstate::{resolve, ParamValue};
//!
//! let resolved = resolve("/users/42?tab=posts&tag=a&tag=b").unwrap();
//! assert_eq!(resolved.segments(), ["users", "42"]);
//! assert_eq!(resolved.query().get_str("tab"), Some("posts"));
//! assert_eq!(
//!     resolved.query().get("tag"),
//!     Some(&ParamValue::Multiple(vec!["a".into(), "b".into()]))
//! );
//! ```

use crate::{trace_log, NavigationError, RouteParams};

/// Segment that addresses a navigator's root.
pub const INDEX_SEGMENT: &str = "index";

/// A parsed path: decoded segments plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPath {
    segments: Vec<String>,
    query: RouteParams,
}

impl ResolvedPath {
    /// Build a resolved path from already-decoded parts.
    pub fn new(segments: Vec<String>, query: RouteParams) -> Self {
        Self { segments, query }
    }

    /// Decoded path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Decoded query parameters.
    pub fn query(&self) -> &RouteParams {
        &self.query
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (Vec<String>, RouteParams) {
        (self.segments, self.query)
    }

    /// Re-encoded pathname, always with a leading slash.
    ///
    /// ```
    /// use navstate::resolve;
    ///
    /// assert_eq!(resolve("users//42/").unwrap().pathname(), "/users/42");
    /// assert_eq!(resolve("").unwrap().pathname(), "/");
    /// ```
    pub fn pathname(&self) -> String {
        encode_pathname(&self.segments)
    }

    /// Re-encoded pathname plus query string.
    ///
    /// ```
    /// use navstate::resolve;
    ///
    /// let resolved = resolve("/?a=(param)").unwrap();
    /// assert_eq!(resolved.to_href(), "/?a=%28param%29");
    /// ```
    pub fn to_href(&self) -> String {
        let pathname = self.pathname();
        if self.query.is_empty() {
            pathname
        } else {
            format!("{}?{}", pathname, encode_query(&self.query))
        }
    }
}

/// Resolve a path string into segments and query parameters.
///
/// Fails with [`NavigationError::MalformedPath`] only when percent-encoding
/// cannot be decoded.
pub fn resolve(path: &str) -> Result<ResolvedPath, NavigationError> {
    let without_fragment = path.split_once('#').map_or(path, |(before, _)| before);
    let (pathname, query_string) = match without_fragment.split_once('?') {
        Some((pathname, query)) => (pathname, Some(query)),
        None => (without_fragment, None),
    };

    let mut segments = Vec::new();
    for raw in pathname.split('/').filter(|s| !s.is_empty()) {
        segments.push(decode_component(raw, false).map_err(|reason| {
            NavigationError::malformed_path(path, format!("segment '{}': {}", raw, reason))
        })?);
    }

    while segments.last().is_some_and(|last| last == INDEX_SEGMENT) {
        segments.pop();
    }

    let query = match query_string {
        Some(query) => {
            parse_query(query).map_err(|reason| NavigationError::malformed_path(path, reason))?
        }
        None => RouteParams::new(),
    };

    trace_log!(
        "Resolved path '{}' → segments={:?}, {} query params",
        path,
        segments,
        query.len()
    );

    Ok(ResolvedPath { segments, query })
}

fn parse_query(query: &str) -> Result<RouteParams, String> {
    let mut params = RouteParams::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key, true)
            .map_err(|reason| format!("query key '{}': {}", raw_key, reason))?;
        let value = decode_component(raw_value, true)
            .map_err(|reason| format!("query value '{}': {}", raw_value, reason))?;
        params.append(key, value);
    }

    Ok(params)
}

/// Encode decoded segments into a pathname.
pub fn encode_pathname(segments: &[String]) -> String {
    let mut pathname = String::from("/");
    pathname.push_str(
        &segments
            .iter()
            .map(|segment| encode_component(segment))
            .collect::<Vec<_>>()
            .join("/"),
    );
    pathname
}

/// Encode parameters into a query string (without the leading `?`).
///
/// Array values repeat their key once per value.
pub fn encode_query(params: &RouteParams) -> String {
    params
        .iter()
        .flat_map(|(key, value)| {
            value
                .values()
                .map(move |v| format!("{}={}", encode_component(key), encode_component(v)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(char::from(byte));
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Percent-decode a component. With `plus_as_space`, `+` decodes to a space
/// (query strings only).
pub fn decode_component(s: &str, plus_as_space: bool) -> Result<String, String> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| format!("truncated escape at byte {}", i))?;
                let high = hex_value(hex[0]);
                let low = hex_value(hex[1]);
                match (high, low) {
                    (Some(high), Some(low)) => decoded.push((high << 4) | low),
                    _ => return Err(format!("invalid escape at byte {}", i)),
                }
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            other => {
                decoded.push(other);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).map_err(|_| "escapes do not form valid UTF-8".to_string())
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;

    #[test]
    fn test_split_segments() {
        assert_eq!(resolve("/users/123").unwrap().segments(), ["users", "123"]);
        assert_eq!(resolve("users/123/").unwrap().segments(), ["users", "123"]);
        assert!(resolve("/").unwrap().segments().is_empty());
        assert!(resolve("").unwrap().segments().is_empty());
        assert!(resolve("//").unwrap().segments().is_empty());
    }

    #[test]
    fn test_trailing_index_maps_to_root() {
        assert!(resolve("/index").unwrap().segments().is_empty());
        assert_eq!(resolve("/settings/index").unwrap().segments(), ["settings"]);
        assert_eq!(
            resolve("/index/settings").unwrap().segments(),
            ["index", "settings"]
        );
    }

    #[test]
    fn test_query_split_at_first_question_mark() {
        let resolved = resolve("/page?a=1?b=2").unwrap();
        assert_eq!(resolved.segments(), ["page"]);
        assert_eq!(resolved.query().get_str("a"), Some("1?b=2"));
    }

    #[test]
    fn test_repeated_keys_produce_array() {
        let resolved = resolve("/?array=1&array=2").unwrap();
        assert_eq!(
            resolved.query().get("array"),
            Some(&ParamValue::Multiple(vec!["1".to_string(), "2".to_string()]))
        );
        assert_eq!(resolved.to_href(), "/?array=1&array=2");
    }

    #[test]
    fn test_parentheses_round_trip() {
        let resolved = resolve("/?a=(param)").unwrap();
        assert_eq!(resolved.query().get_str("a"), Some("(param)"));
        assert_eq!(resolved.to_href(), "/?a=%28param%29");

        let again = resolve(&resolved.to_href()).unwrap();
        assert_eq!(again, resolved);
    }

    #[test]
    fn test_decodes_keys_values_and_segments() {
        let resolved = resolve("/hello%20world?na%6De=J%C3%BCrgen+K").unwrap();
        assert_eq!(resolved.segments(), ["hello world"]);
        assert_eq!(resolved.query().get_str("name"), Some("Jürgen K"));
    }

    #[test]
    fn test_plus_is_literal_in_segments() {
        let resolved = resolve("/a+b").unwrap();
        assert_eq!(resolved.segments(), ["a+b"]);
    }

    #[test]
    fn test_key_without_value() {
        let resolved = resolve("/page?flag&x=").unwrap();
        assert_eq!(resolved.query().get_str("flag"), Some(""));
        assert_eq!(resolved.query().get_str("x"), Some(""));
    }

    #[test]
    fn test_fragment_is_ignored() {
        let resolved = resolve("/page?a=1#section").unwrap();
        assert_eq!(resolved.query().get_str("a"), Some("1"));
    }

    #[test]
    fn test_malformed_percent_encoding() {
        assert!(resolve("/a%zz").unwrap_err().is_malformed_path());
        assert!(resolve("/a%2").unwrap_err().is_malformed_path());
        assert!(resolve("/?a=%").unwrap_err().is_malformed_path());
        assert!(resolve("/%FF%FE").unwrap_err().is_malformed_path());
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("hello world"), "hello%20world");
        assert_eq!(encode_component("(a)"), "%28a%29");
        assert_eq!(encode_component("ü"), "%C3%BC");
        assert_eq!(encode_component("a-b_c.d~"), "a-b_c.d~");
    }
}
