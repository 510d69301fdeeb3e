//! HTTP client for the crossing feed.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::error::FeedError;
use super::types::FeedEnvelope;
use super::CrossingFeed;

/// Default feed endpoint (Sugar Land rail monitor).
pub const DEFAULT_FEED_URL: &str = "http://its.sugarlandtx.gov/api/railmonitor";

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Endpoint returning the feed document
    pub url: String,
    /// Transport-level request timeout in milliseconds
    pub timeout_ms: u64,
}

impl FeedConfig {
    /// Create a config for the given endpoint.
    ///
    /// URLs without an `http:` or `https:` scheme are assumed to be https.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: normalize_url(url.into()),
            timeout_ms: 10_000,
        }
    }

    /// Set the transport timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}

fn normalize_url(url: String) -> String {
    if url.starts_with("http:") || url.starts_with("https:") {
        url
    } else {
        format!("https://{url}")
    }
}

/// HTTP client for the crossing feed.
///
/// The client's own timeout is a backstop; the check cycle's deadline is
/// applied by [`super::fetch_before`].
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CrossingFeed for FeedClient {
    async fn fetch(&self) -> Result<FeedEnvelope, FeedError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            return Err(FeedError::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;

        let envelope: FeedEnvelope =
            serde_json::from_str(&body).map_err(|e| FeedError::Decode {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        debug!(
            crossings = envelope.crossings.len(),
            update_timestamp = %envelope.update_timestamp,
            "decoded crossing feed"
        );

        Ok(envelope)
    }
}
