// src/crawl/result.rs
// =============================================================================
// One record on the result stream.
//
// Every visited URL produces exactly one of these: a Success with the page
// title, or a Failure holding the error (which knows its own URL).
// =============================================================================

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::CrawlError;

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CrawlResult {
    Success {
        url: String,
        title: String,
    },
    Failure {
        #[serde(serialize_with = "serialize_error")]
        error: CrawlError,
    },
}

impl CrawlResult {
    pub fn url(&self) -> &str {
        match self {
            CrawlResult::Success { url, .. } => url,
            CrawlResult::Failure { error } => error.url(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CrawlResult::Success { .. })
    }
}

// The log line printed for each record
impl fmt::Display for CrawlResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlResult::Success { url, title } => {
                write!(f, "crawler result: [url: {}] Title: {}", url, title)
            }
            CrawlResult::Failure { error } => write!(f, "crawler result return err: {}", error),
        }
    }
}

// Errors go out as their Display message
fn serialize_error<S: Serializer>(error: &CrawlError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}
