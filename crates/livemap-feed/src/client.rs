//! HTTP client for the upstream incident feed.

use std::time::Duration;

use reqwest::Client;

use crate::error::FeedError;
use crate::filters::ExclusionFilters;
use crate::retry::retry_with_backoff;
use crate::snapshot::{decode_snapshot, FeedSnapshot};

/// Fetches the feed document over HTTP.
///
/// Transient failures (timeouts, connection errors, 5xx, 429) are retried with
/// exponential back-off; see [`FeedClient::with_retry`].
pub struct FeedClient {
    client: Client,
    url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FeedClient {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            url: url.to_owned(),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Downloads the raw feed body.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Http`] on network failure or timeout.
    /// - [`FeedError::UnexpectedStatus`] on a non-2xx response.
    pub async fn fetch(&self) -> Result<String, FeedError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.fetch_once()).await
    }

    /// Downloads and decodes the feed into a snapshot.
    ///
    /// # Errors
    ///
    /// Any error from [`FeedClient::fetch`], or a decode error when the body
    /// is not a usable RSS/Atom document.
    pub async fn fetch_snapshot(
        &self,
        filters: &ExclusionFilters,
    ) -> Result<FeedSnapshot, FeedError> {
        let body = self.fetch().await?;
        decode_snapshot(&body, filters)
    }

    async fn fetch_once(&self) -> Result<String, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body = response.text().await?;
        tracing::debug!(url = %self.url, bytes = body.len(), "feed fetched");
        Ok(body)
    }
}
