//! Intercepted request model.

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use stowaway_core::{Error, RequestKey};
use url::Url;

/// A request captured by the router before it reaches the network.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Build from a method name as received from the host (case-insensitive).
    pub fn with_method(method: &str, url: Url) -> Result<Self, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {method:?}")))?;
        Ok(Self::new(method, url))
    }

    /// Add a header; invalid names or values are dropped with a debug log.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::debug!(header = name, "dropping invalid request header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Every declared `Accept` value, in order.
    pub fn accept(&self) -> impl Iterator<Item = &str> {
        self.headers.get_all(ACCEPT).iter().filter_map(|v| v.to_str().ok())
    }

    /// Whether any `Accept` value asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.accept().any(|accept| accept.contains("text/html"))
    }

    /// Cache identity of this request; headers take no part.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.as_str(), self.url.as_str())
    }

    /// Headers flattened to owned pairs, in the order they were added.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect()
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
        let request = InterceptedRequest::get(url("http://localhost:5000/dashboard"))
            .with_header("Accept", "text/html,application/xhtml+xml;q=0.9");
        assert!(request.accepts_html());

        let request = InterceptedRequest::get(url("http://localhost:5000/favicon.ico")).with_header("Accept", "image/*");
        assert!(!request.accepts_html());
    }

    #[test]
    fn test_missing_accept_is_not_html() {
        let request = InterceptedRequest::get(url("http://localhost:5000/dashboard"));
        assert_eq!(request.accept().count(), 0);
        assert!(!request.accepts_html());
    }

    #[test]
    fn test_accepts_html_in_any_accept_value() {
        let request = InterceptedRequest::get(url("http://localhost:5000/dashboard"))
            .with_header("Accept", "application/json")
            .with_header("Accept", "text/html");
        assert_eq!(request.accept().collect::<Vec<_>>(), vec!["application/json", "text/html"]);
        assert!(request.accepts_html());
    }

    #[test]
    fn test_with_method() {
        let request = InterceptedRequest::with_method("post", url("http://localhost:5000/api/projects")).unwrap();
        assert_eq!(request.method, Method::POST);
        assert!(InterceptedRequest::with_method("BAD METHOD", url("http://localhost:5000/")).is_err());
    }

    #[test]
    fn test_key_ignores_headers() {
        let plain = InterceptedRequest::get(url("http://localhost:5000/api/flows"));
        let with_headers = plain.clone().with_header("Accept", "application/json");
        assert_eq!(plain.key(), with_headers.key());
        assert_eq!(plain.key().method, "GET");
    }

    #[test]
    fn test_invalid_header_dropped() {
        let request = InterceptedRequest::get(url("http://localhost:5000/")).with_header("bad header", "x");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_header_pairs() {
        let request = InterceptedRequest::new(Method::POST, url("http://localhost:5000/api/projects"))
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        assert_eq!(request.header_pairs(), vec![("content-type".to_string(), "application/json".to_string())]);
        assert_eq!(request.body.as_deref(), Some(&b"{}"[..]));
    }
}
