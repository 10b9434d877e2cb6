//! Feed discovery: fetch a page and scan it for autodiscovery tags while
//! probing conventional feed paths, then merge whatever both strategies find.

use std::collections::HashSet;

use futures::StreamExt;
use serde::Serialize;
use thiserror::Error;

use crate::fetch::{FetchClient, FetchError};
use crate::util::{validate_url, TargetUrl};

pub mod extractor;
pub mod prober;

/// Page bodies larger than this are abandoned mid-read.
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// MIME types that advertise a feed, in `<link type="...">` attributes and
/// in `Content-Type` response headers alike.
const FEED_MIME_TYPES: [&str; 5] = [
    "application/rss+xml",
    "application/atom+xml",
    "application/rdf+xml",
    "text/xml",
    "application/xml",
];

/// Feed syntax family, as reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedType {
    #[serde(rename = "RSS")]
    Rss,
    #[serde(rename = "Atom")]
    Atom,
}

impl FeedType {
    /// Atom iff the MIME string says so; RSS otherwise, including for the
    /// generic XML types.
    fn from_mime(mime: &str) -> Self {
        if mime.to_ascii_lowercase().contains("atom") {
            FeedType::Atom
        } else {
            FeedType::Rss
        }
    }
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscoveryMethod {
    #[serde(rename = "meta-tag")]
    MetaTag,
    #[serde(rename = "common-path")]
    CommonPath,
}

/// A discovered feed. `url` is always absolute, resolved against a
/// validated base.
#[derive(Debug, Clone, Serialize)]
pub struct FeedResult {
    pub url: String,
    pub title: String,
    #[serde(rename = "type")]
    pub feed_type: FeedType,
    #[serde(rename = "discoveryMethod")]
    pub discovery_method: DiscoveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Errors a discovery run can end with. Single-branch failures are absorbed
/// when the sibling branch still produced results; these surface only on
/// total failure.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The target could not be fetched: upstream non-2xx (with status) or a
    /// pre-fetch validation refusal (without).
    #[error("{message}")]
    FetchFailed { status: Option<u16>, message: String },
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The fetch exceeded its timeout.
    #[error("request timed out")]
    Timeout,
    /// The response body could not be read or decoded.
    #[error("could not decode response body")]
    Parsing,
    /// The response body exceeded the size limit.
    #[error("response too large")]
    TooLarge,
}

impl From<FetchError> for DiscoveryError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Status(code) => DiscoveryError::FetchFailed {
                status: Some(code),
                message: format!("target responded with status {code}"),
            },
            FetchError::Network(e) => DiscoveryError::Network(e),
            FetchError::Timeout => DiscoveryError::Timeout,
        }
    }
}

/// Discovery orchestrator. Stateless across calls; cheap to clone.
#[derive(Clone)]
pub struct Discovery {
    client: FetchClient,
}

impl Discovery {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Runs both discovery strategies against a target URL and merges their
    /// results.
    ///
    /// The target is validated here even though the request handler already
    /// did so; a validation refusal at this layer surfaces as
    /// [`DiscoveryError::FetchFailed`] carrying the validator's message.
    ///
    /// # Errors
    ///
    /// Only when the page branch failed *and* probing found nothing; a
    /// failing page fetch with non-empty probe results degrades to those
    /// results instead.
    pub async fn discover(&self, target_url: &str) -> Result<Vec<FeedResult>, DiscoveryError> {
        let target = validate_url(target_url).map_err(|e| DiscoveryError::FetchFailed {
            status: None,
            message: e.to_string(),
        })?;
        self.discover_target(&target).await
    }

    async fn discover_target(&self, target: &TargetUrl) -> Result<Vec<FeedResult>, DiscoveryError> {
        // Both branches go out together: the page fetch and every HEAD probe
        // are in flight at the same time.
        let (page, probed) = tokio::join!(
            self.fetch_and_extract(target),
            prober::probe(&self.client, target),
        );

        if let Err(e) = &page {
            tracing::debug!(error = %e, probed = probed.len(), "page branch failed");
        }

        resolve_outcome(page, probed)
    }

    /// Branch (a): GET the page, read a bounded body, scan it for
    /// autodiscovery tags.
    async fn fetch_and_extract(
        &self,
        target: &TargetUrl,
    ) -> Result<Vec<FeedResult>, DiscoveryError> {
        let response = self.client.get(target).await?;
        let body = read_limited_body(response).await?;
        Ok(extractor::extract(&body, target.as_url()))
    }
}

/// Reads a response body with a size cap, decoding lossily to UTF-8.
async fn read_limited_body(response: reqwest::Response) -> Result<String, DiscoveryError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > MAX_BODY_SIZE {
            return Err(DiscoveryError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|_| DiscoveryError::Parsing)?;
        if bytes.len().saturating_add(chunk.len()) > MAX_BODY_SIZE {
            return Err(DiscoveryError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Folds the two branch outcomes into the final result.
fn resolve_outcome(
    page: Result<Vec<FeedResult>, DiscoveryError>,
    probed: Vec<FeedResult>,
) -> Result<Vec<FeedResult>, DiscoveryError> {
    match page {
        Ok(meta) => Ok(merge(meta, probed)),
        // Page branch failed but probing found feeds: degrade, don't fail
        Err(_) if !probed.is_empty() => Ok(probed),
        Err(e) => Err(e),
    }
}

/// Meta-tag results first, then common-path, deduplicated by URL with the
/// first occurrence winning.
fn merge(meta: Vec<FeedResult>, common: Vec<FeedResult>) -> Vec<FeedResult> {
    let mut seen = HashSet::new();
    meta.into_iter()
        .chain(common)
        .filter(|feed| seen.insert(feed.url.clone()))
        .collect()
}

/// `text/xml; charset=utf-8` → `text/xml`
fn mime_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_feed_mime(essence: &str) -> bool {
    FEED_MIME_TYPES.contains(&essence)
}
