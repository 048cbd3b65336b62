//! HTTP client with per-request timeout, static headers and rate limiting
//!
//! One instance talks to the source catalog (no auth), another to the content
//! store (auth headers, requests-per-second quota shared by all workers).

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;

use super::sync_error::{SyncError, SyncResult};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// `None` disables rate limiting
    pub max_requests_per_second: Option<u32>,
    /// Sent with every request
    pub default_headers: Vec<(String, String)>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("show-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 10,
            max_requests_per_second: None,
            default_headers: Vec::new(),
        }
    }
}

/// Shared, cheaply clonable HTTP client
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: Option<Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
}

impl HttpClient {
    pub fn new(config: &HttpClientConfig) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| SyncError::ClientSetup {
                reason: format!("invalid header name '{name}': {e}"),
            })?;
            let mut value = HeaderValue::from_str(value).map_err(|e| SyncError::ClientSetup {
                reason: format!("invalid value for header '{name}': {e}"),
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| SyncError::ClientSetup {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        let rate_limiter = match config.max_requests_per_second {
            Some(rps) => {
                let rps = NonZeroU32::new(rps).ok_or_else(|| SyncError::ClientSetup {
                    reason: "rate limit must be greater than 0".to_string(),
                })?;
                Some(Arc::new(RateLimiter::direct(Quota::per_second(rps))))
            }
            None => None,
        };

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Wait for the rate limiter, then send. Only transport failures are errors here.
    pub async fn send(&self, url: &str, request: RequestBuilder) -> SyncResult<Response> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        tracing::debug!("HTTP {}", url);
        request
            .send()
            .await
            .map_err(|e| SyncError::transport(url, e))
    }

    /// GET `url`, require a 2xx status and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> SyncResult<T> {
        let response = self.send(url, self.request(Method::GET, url)).await?;
        let response = require_success(url, response)?;
        read_json(url, response).await
    }

    /// GET `url`, require a 2xx status and return the raw body.
    pub async fn get_bytes(&self, url: &str) -> SyncResult<Vec<u8>> {
        let response = self.send(url, self.request(Method::GET, url)).await?;
        let response = require_success(url, response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::transport(url, e))?;
        Ok(bytes.to_vec())
    }
}

pub fn require_success(url: &str, response: Response) -> SyncResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(SyncError::unexpected_status(url, response.status()))
    }
}

pub fn require_status(url: &str, response: Response, expected: StatusCode) -> SyncResult<Response> {
    if response.status() == expected {
        Ok(response)
    } else {
        Err(SyncError::unexpected_status(url, response.status()))
    }
}

pub async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> SyncResult<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| SyncError::transport(url, e))?;
    serde_json::from_slice(&body).map_err(|e| SyncError::decode(url, e))
}
