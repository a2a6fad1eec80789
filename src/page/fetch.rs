// src/page/fetch.rs
// =============================================================================
// This module downloads pages.
//
// Key functionality:
// - PageFetcher: the seam the crawler fetches through (a trait, so tests can
//   plug in an in-memory site)
// - HttpFetcher: the real implementation, one GET per call, no retries
// - Every fetch has a deadline; going past it is a CrawlError::Timeout
// - A fetch asked for after the crawl was cancelled does nothing and
//   reports FetchOutcome::Skipped (not an error: nobody is listening anymore)
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::CrawlError;

/// What a fetch produced when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Raw response body
    Fetched(Vec<u8>),
    /// The crawl was already cancelled, no request was made
    Skipped,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, cancel: &CancellationToken)
        -> Result<FetchOutcome, CrawlError>;
}

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    // Builds the reqwest client once; it is reused for every request
    // (connection pooling).
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("depth-crawler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.categorize_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.categorize_error(url, e))?;
        Ok(body.to_vec())
    }

    fn categorize_error(&self, url: &str, error: reqwest::Error) -> CrawlError {
        if error.is_timeout() {
            CrawlError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else if error.is_builder() {
            // reqwest refuses to even build the request: bad or relative url
            CrawlError::InvalidUrl {
                url: url.to_string(),
                reason: error.to_string(),
            }
        } else {
            CrawlError::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, CrawlError> {
        if cancel.is_cancelled() {
            trace!(url, "fetch skipped, crawl cancelled");
            return Ok(FetchOutcome::Skipped);
        }

        // The client timeout covers the request; this one also covers the body
        match tokio::time::timeout(self.timeout, self.get(url)).await {
            Ok(result) => result.map(FetchOutcome::Fetched),
            Err(_) => Err(CrawlError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
