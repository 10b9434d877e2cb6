use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use thiserror::Error;

use crate::util::TargetUrl;

/// Identifying header attached to every outbound request.
pub const PRODUCT_USER_AGENT: &str = concat!("feedscout/", env!("CARGO_PKG_VERSION"));

/// Per-request wall-clock budget when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Errors from a single outbound request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target responded with a non-2xx status.
    #[error("request failed: status {0}")]
    Status(u16),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,
}

/// Outbound HTTP client with a mandatory timeout and a fixed identity.
///
/// Accepts only [`TargetUrl`], so every request it makes has passed SSRF
/// validation. Each call is exactly one network round trip: no retries,
/// no redirect from failure to a second attempt — failures are classified
/// and reported upward.
#[derive(Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl FetchClient {
    /// Builds a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// GET the target and return the response with its headers and body
    /// stream intact.
    ///
    /// # Errors
    ///
    /// [`FetchError::Timeout`] past the deadline, [`FetchError::Network`] on
    /// transport failure, [`FetchError::Status`] on a non-2xx response.
    pub async fn get(&self, url: &TargetUrl) -> Result<reqwest::Response, FetchError> {
        self.request(Method::GET, url, HeaderMap::new()).await
    }

    /// HEAD the target — a lightweight existence/content-type check.
    ///
    /// # Errors
    ///
    /// Same classification as [`FetchClient::get`].
    pub async fn head(&self, url: &TargetUrl) -> Result<reqwest::Response, FetchError> {
        self.request(Method::HEAD, url, HeaderMap::new()).await
    }

    /// Issues a single request with extra headers.
    ///
    /// Caller headers are applied first and the product User-Agent is set
    /// afterwards, so it wins any collision.
    pub async fn request(
        &self,
        method: Method,
        url: &TargetUrl,
        headers: HeaderMap,
    ) -> Result<reqwest::Response, FetchError> {
        let mut headers = headers;
        headers.insert(USER_AGENT, HeaderValue::from_static(PRODUCT_USER_AGENT));

        let send = self
            .client
            .request(method, url.as_url().clone())
            .headers(headers)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response)
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
