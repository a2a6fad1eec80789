// src/crawl/consumer.rs
// =============================================================================
// The one and only reader of the result stream.
//
// It logs every record and counts down two quotas. Whichever quota hits
// zero first cancels the whole crawl. The crawler itself knows nothing
// about quotas: this is the only place they are enforced.
// =============================================================================

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::result::CrawlResult;

/// Why the consumer stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every reachable page within the depth budget was visited
    Exhausted,
    /// max_results successes were seen
    ResultQuota,
    /// max_errors failures were seen
    ErrorQuota,
    /// Someone else cancelled the crawl (interrupt, runtime limit)
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            StopReason::Exhausted => "no more pages to crawl",
            StopReason::ResultQuota => "result quota reached",
            StopReason::ErrorQuota => "error quota reached",
            StopReason::Cancelled => "crawl cancelled",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Serialize)]
pub struct CrawlSummary {
    pub stop: StopReason,
    pub successes: usize,
    pub failures: usize,
    pub results: Vec<CrawlResult>,
}

pub struct ResultConsumer {
    results_left: usize,
    errors_left: usize,
    cancel: CancellationToken,
}

impl ResultConsumer {
    pub fn new(max_results: usize, max_errors: usize, cancel: CancellationToken) -> Self {
        Self {
            results_left: max_results,
            errors_left: max_errors,
            cancel,
        }
    }

    // Reads until the stream closes, a quota runs out, or the crawl is cancelled
    pub async fn drain(mut self, mut stream: mpsc::Receiver<CrawlResult>) -> CrawlSummary {
        let mut results = Vec::new();
        let mut successes = 0;
        let mut failures = 0;

        let stop = loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                next = stream.recv() => match next {
                    Some(result) => result,
                    None => break StopReason::Exhausted,
                },
            };

            let quota_hit = if result.is_success() {
                successes += 1;
                info!("{}", result);
                self.results_left = self.results_left.saturating_sub(1);
                (self.results_left == 0).then_some(StopReason::ResultQuota)
            } else {
                failures += 1;
                warn!("{}", result);
                self.errors_left = self.errors_left.saturating_sub(1);
                (self.errors_left == 0).then_some(StopReason::ErrorQuota)
            };
            results.push(result);

            if let Some(reason) = quota_hit {
                self.cancel.cancel();
                break reason;
            }
        };

        CrawlSummary {
            stop,
            successes,
            failures,
            results,
        }
    }
}
