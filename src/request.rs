//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, Uri};

/// An incoming HTTP request with its body fully buffered.
///
/// The query string is decoded once on construction. Repeated names keep
/// every value in arrival order, so `?tag=a&tag=b` yields both through
/// [`Request::query_all`].
pub struct Request {
    pub(crate) parts: http::request::Parts,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) query: Vec<(String, String)>,
}

impl Request {
    /// Wraps an already-buffered `http::Request`.
    ///
    /// The server calls this after collecting the body; tests and in-memory
    /// hosts can call it directly.
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let query = parts.uri.query()
            .map(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).unwrap_or_default())
            .unwrap_or_default();
        Self { parts, body, params: HashMap::new(), query }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method { &self.parts.method }
    pub fn uri(&self) -> &Uri { &self.parts.uri }
    pub fn path(&self) -> &str { self.parts.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.parts.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First decoded value for `key`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every decoded value for `key`, in the order they appeared.
    pub fn query_all(&self, key: &str) -> Vec<&str> {
        self.query.iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }


    /// Per-request typed state shared between middleware and handlers.
    pub fn extensions(&self) -> &Extensions { &self.parts.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.parts.extensions }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> Request {
        Request::from_http(http::Request::get(uri).body(Bytes::new()).unwrap())
    }

    #[test]
    fn decodes_query_pairs() {
        let req = get("/page?sc_lang=da-DK&route=%2Fabout%20us");
        assert_eq!(req.query("sc_lang"), Some("da-DK"));
        assert_eq!(req.query("route"), Some("/about us"));
        assert_eq!(req.path(), "/page");
    }

    #[test]
    fn keeps_repeated_values_in_order() {
        let req = get("/?tag=a&other=x&tag=b");
        assert_eq!(req.query_all("tag"), vec!["a", "b"]);
        assert_eq!(req.query("tag"), Some("a"));
    }

    #[test]
    fn empty_value_still_counts_as_present() {
        let req = get("/?mode=");
        assert_eq!(req.query("mode"), Some(""));
        assert_eq!(req.query_all("mode"), vec![""]);
    }

    #[test]
    fn no_query_string() {
        let req = get("/");
        assert!(req.query.is_empty());
        assert_eq!(req.query("mode"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::from_http(
            http::Request::get("/")
                .header("X-Forwarded-Host", "example.com")
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(req.header("x-forwarded-host"), Some("example.com"));
    }
}
