//! Request and response values that flow through the worker.
//!
//! These are plain owned values so they can be cloned into background
//! revalidation tasks and stored verbatim in a cache store.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// A request issued by a page session.
#[derive(Debug, Clone)]
pub struct WorkerRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WorkerRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// Shorthand for a GET request without headers.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Add a header, ignoring values that are not valid header text.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Whether the `Accept` header asks for an HTML document.
    ///
    /// A missing header never counts as HTML.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }

    /// Store key for this request: method plus URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        compute_cache_key(self.method.as_str(), url.as_str())
    }
}

/// A response, either from the network, a cache store, or synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WorkerResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    /// Synthetic 503 used whenever neither network nor cache can answer.
    pub fn offline(message: &'static str) -> Self {
        let mut response = Self::new(StatusCode::SERVICE_UNAVAILABLE, Bytes::from_static(message.as_bytes()));
        response
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }

    /// Only plain 200 responses are ever written to a store.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Headers as ordered name/value pairs, for persistence.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect()
    }

    /// Rebuild a header map from persisted pairs, skipping invalid entries.
    pub fn headers_from_pairs(pairs: &[(String, String)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                headers.append(name, value);
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_accepts_html() {
        let req = WorkerRequest::get(url("https://example.com/about"))
            .with_header(header::ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8");
        assert!(req.accepts_html());
    }

    #[test]
    fn test_missing_accept_is_not_html() {
        let req = WorkerRequest::get(url("https://example.com/about"));
        assert!(!req.accepts_html());
    }

    #[test]
    fn test_cache_key_ignores_fragment() {
        let a = WorkerRequest::get(url("https://example.com/index.html#projects"));
        let b = WorkerRequest::get(url("https://example.com/index.html"));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_depends_on_method() {
        let get = WorkerRequest::get(url("https://example.com/form"));
        let post = WorkerRequest::new(Method::POST, url("https://example.com/form"));
        assert_ne!(get.cache_key(), post.cache_key());
    }

    #[test]
    fn test_offline_response() {
        let response = WorkerResponse::offline("Offline");
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, Bytes::from_static(b"Offline"));
        assert_eq!(response.content_type(), Some("text/plain; charset=utf-8"));
        assert!(!response.is_cacheable());
    }

    #[test]
    fn test_header_pairs_roundtrip_preserves_repeats() {
        let mut response = WorkerResponse::new(StatusCode::OK, "body");
        response.headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        response.headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        let rebuilt = WorkerResponse::headers_from_pairs(&response.header_pairs());
        assert_eq!(rebuilt.get_all(header::SET_COOKIE).iter().count(), 2);
    }
}
