// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Two families:
// - CrawlError: something went wrong while visiting ONE url (fetch, timeout,
//   bad status, unparseable page). These are never fatal to the crawl, they
//   just use up one unit of the error quota.
// - ConfigError: the startup configuration is unusable. The binary refuses
//   to start.
//
// We use `thiserror` so each variant gets a Display message from its
// #[error(...)] attribute and a proper std::error::Error impl for free.
// =============================================================================

use thiserror::Error;

/// Failure attributed to a single crawled URL
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The HTTP request itself failed (connection refused, DNS, TLS, ...)
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The fetch did not finish before the deadline
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The server answered with a non-2xx status
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The url could not be turned into a request at all
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The fetched body could not be read as a page
    #[error("could not parse page {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl CrawlError {
    // Every crawl error is attributed to the url that produced it
    pub fn url(&self) -> &str {
        match self {
            CrawlError::Request { url, .. }
            | CrawlError::Timeout { url, .. }
            | CrawlError::Status { url, .. }
            | CrawlError::InvalidUrl { url, .. }
            | CrawlError::Parse { url, .. } => url,
        }
    }
}

/// Startup configuration problems
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("start url '{url}' is not valid: {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("start url '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },
}
