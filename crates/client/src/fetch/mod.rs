//! HTTP upstream fetcher.
//!
//! ### Request
//! - `GET <base>/<key>` with the configured User-Agent
//! - Timeout and redirect limit from [`FetchConfig`]
//!
//! ### Failure classification
//! - Network failure or non-2xx status: `HTTP_ERROR`
//! - Timeout: `FETCH_TIMEOUT`
//! - Declared or actual body over `max_bytes`: `FETCH_TOO_LARGE`
//!
//! No retries; a failed key is simply fetched again on the next request.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};

pub use self::url::{UrlError, canonicalize, resource_url};

use catcache_core::{AppConfig, CacheKey, Error, Upstream};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "catcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "catcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
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

/// Upstream that fetches images over HTTP.
pub struct HttpUpstream {
    http: Client,
    base: Url,
    config: FetchConfig,
}

impl HttpUpstream {
    /// Create a fetcher for resources under `base_url`.
    pub fn new(config: FetchConfig, base_url: &str) -> Result<Self, Error> {
        let base = canonicalize(base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base, config })
    }

    /// Create a fetcher from the application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(FetchConfig::from(config), &config.upstream_url)
    }

    async fn get(&self, key: &CacheKey) -> Result<Bytes, Error> {
        let start = Instant::now();
        let url = resource_url(&self.base, key).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let response = self.http.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url}: {e}"))
            } else {
                Error::HttpError(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} from {url}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len > self.config.max_bytes as u64
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url}: {e}"))
            } else {
                Error::HttpError(format!("failed to read response: {e}"))
            }
        })?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!("fetched {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), bytes.len());

        Ok(bytes)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, key: &CacheKey) -> Result<Bytes, Error> {
        self.get(key).await
    }
}
