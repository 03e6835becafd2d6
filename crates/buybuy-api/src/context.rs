//! Request context with decoded query parameters.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use http::{Method, Request};
use uuid::Uuid;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Query string parameters.
pub type QueryParams = HashMap<String, String>;

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Everything a handler needs to know about one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// Decoded query string parameters; a repeated key keeps its last value.
    pub query: QueryParams,
    started: Instant,
}

impl RequestContext {
    /// Create a context for a method and a path that may carry a query string.
    pub fn new(method: Method, path_and_query: &str) -> Self {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, qs)) => (path, parse_query_string(qs)),
            None => (path_and_query, QueryParams::new()),
        };
        Self {
            request_id: RequestId::generate(),
            method,
            path: path.to_string(),
            query,
            started: Instant::now(),
        }
    }

    /// Build a context from an `http::Request`, honouring `x-request-id`.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let uri = request.uri();
        let mut ctx = Self::new(request.method().clone(), uri.path());
        if let Some(qs) = uri.query() {
            ctx.query = parse_query_string(qs);
        }
        if let Some(id) = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
        {
            ctx.request_id = RequestId::from_string(id.trim());
        }
        ctx
    }

    /// Get a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|s| s.as_str())
    }

    /// Microseconds since the context was created.
    pub fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }
}

/// Parse `a=1&b=two+words` into decoded pairs.
pub fn parse_query_string(qs: &str) -> QueryParams {
    qs.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

/// Decode `%XX` escapes and `+` as space. Malformed escapes are kept verbatim;
/// invalid UTF-8 is replaced.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                match (hex(bytes.get(i + 1)), hex(bytes.get(i + 2))) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex(byte: Option<&u8>) -> Option<u8> {
    match byte? {
        b @ b'0'..=b'9' => Some(b - b'0'),
        b @ b'a'..=b'f' => Some(b - b'a' + 10),
        b @ b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("red+phone"), "red phone");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
        assert_eq!(percent_decode("50%25"), "50%");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_parse_query_string() {
        let q = parse_query_string("category=1&search=usb+c&&flag&page=2&page=3");
        assert_eq!(q.get("category").map(String::as_str), Some("1"));
        assert_eq!(q.get("search").map(String::as_str), Some("usb c"));
        assert_eq!(q.get("flag").map(String::as_str), Some(""));
        assert_eq!(q.get("page").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_context_from_request() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/products/?min_price=10")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(())
            .unwrap();
        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.path, "/products/");
        assert_eq!(ctx.query_param("min_price"), Some("10"));
        assert_eq!(ctx.request_id.to_string(), "abc-123");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
