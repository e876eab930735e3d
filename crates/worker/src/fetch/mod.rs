//! Network seam for the router.
//!
//! ### Failure semantics
//! - Only transport failures (connection refused, DNS, timeout, body read
//!   errors, oversized bodies) are errors.
//! - Any HTTP status, including 4xx/5xx, is a successful fetch and is
//!   returned unchanged; callers decide what an error status means.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: configurable (default 10MB)

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, resolve};

use crate::request::InterceptedRequest;
use stowaway_core::{AppConfig, CachedResponse, Error};

/// Something that can carry a request to the network.
///
/// The router only talks to the network through this trait.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. `Err` means the request never produced a response.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<CachedResponse, Error>;
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "stowaway/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "stowaway/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed network.
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new HTTP network with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::FetchFailed(format!("timeout: {e}"))
    } else {
        Error::FetchFailed(format!("network error: {e}"))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<CachedResponse, Error> {
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        // bodies are stored decoded
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| **name != header::CONTENT_ENCODING && **name != header::CONTENT_LENGTH)
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(transport_error)?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "{} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(CachedResponse { status: status.as_u16(), headers, body: bytes.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "stowaway/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "dash/2".into(), timeout_ms: 1500, max_bytes: 1024, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "dash/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_bytes, 1024);
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let network = HttpNetwork::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() }).unwrap();
        let request = InterceptedRequest::get(reqwest::Url::parse("http://127.0.0.1:9/").unwrap());
        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(ref e) if e.is_transport()));
    }
}
