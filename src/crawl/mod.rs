// src/crawl/mod.rs
// =============================================================================
// This module runs a crawl from start to finish.
//
// Submodules:
// - crawler: the per-url state machine and the recursive fan-out
// - dispatch: how new crawl units are started (unbounded or capped)
// - consumer: reads results, enforces quotas, decides when to stop
// - result: the record type that flows from crawler to consumer
//
// `run` wires them to a shared CancellationToken and to the control loop.
// Everything that can stop the crawl (quota, interrupt, runtime limit) does
// it by cancelling that one token; nothing ever un-cancels it.
// =============================================================================

mod consumer;
mod crawler;
mod dispatch;
mod result;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::control::{ControlEvent, ControlLoop};
use crate::page::PageFetcher;

use consumer::ResultConsumer;
use crawler::Crawler;
use dispatch::dispatcher;

pub use consumer::{CrawlSummary, StopReason};
pub use crawler::DepthControl;
pub use result::CrawlResult;

// Crawls `config.start_url` and returns once the crawl has stopped.
//
// Parameters:
//   config: validated startup configuration
//   fetcher: where pages come from (HttpFetcher in production)
//   events: terminate / extend-depth commands from the outside world
pub async fn run(
    config: &Config,
    fetcher: Arc<dyn PageFetcher>,
    events: mpsc::Receiver<ControlEvent>,
) -> CrawlSummary {
    let cancel = CancellationToken::new();

    let (crawler, results) =
        Crawler::new(fetcher, dispatcher(config.max_in_flight), cancel.clone());

    let control = ControlLoop::new(
        cancel.clone(),
        crawler.depth_control(),
        config.extend_by,
        config.max_runtime,
    );
    let control_task = tokio::spawn(control.run(events));

    crawler.start(config.start_url.clone(), config.max_depth);

    let summary = ResultConsumer::new(config.max_results, config.max_errors, cancel.clone())
        .drain(results)
        .await;

    // Natural exhaustion leaves the token untouched; the control loop waits on it
    cancel.cancel();
    if let Err(e) = control_task.await {
        warn!("control loop ended abnormally: {}", e);
    }

    info!(
        "crawl finished ({}): {} result(s), {} error(s)",
        summary.stop, summary.successes, summary.failures
    );
    summary
}
