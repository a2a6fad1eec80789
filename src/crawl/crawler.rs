// src/crawl/crawler.rs
// =============================================================================
// The crawler: a recursive, depth-bounded, deduplicated walk over links.
//
// How one crawl unit (url, depth) runs:
// 1. Crawl cancelled?               -> stop, nothing emitted
// 2. depth == 0?                    -> stop, nothing emitted
// 3. try_claim(url) lost?           -> stop, someone else owns this url
// 4. Crawl cancelled?               -> stop, nothing emitted
// 5. Pending depth extension?       -> take one, add it to this unit's depth
// 6. Fetch + parse. On error        -> emit Failure, stop (no retry)
// 7. Emit Success { url, title }
// 8. For every link: start a new unit (link, depth - 1), don't wait for it
//
// Results go into a small channel that only the ResultConsumer reads. When
// the consumer falls behind, units wait at step 6/7: that wait is the
// crawl's only backpressure.
//
// Nobody tracks the units explicitly. Each one holds a clone of the Crawler
// (and therefore of the result sender); when the last unit finishes the
// channel closes and the consumer knows the crawl ran out of pages.
// =============================================================================

use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

use super::dispatch::{CrawlUnit, Dispatch};
use super::result::CrawlResult;
use crate::page::{resolve_link, FetchOutcome, Page, PageFetcher};
use crate::visited::VisitedSet;

/// Sends depth extensions to a running crawl.
///
/// Each extension is picked up by exactly one crawl unit, whichever reaches
/// its pre-fetch check first, and only raises that unit's depth budget
/// (its links inherit the raised budget minus one, as usual).
#[derive(Debug, Clone)]
pub struct DepthControl {
    tx: mpsc::UnboundedSender<u32>,
}

impl DepthControl {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<u32>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    // Returns false once the crawler is gone
    pub fn extend(&self, delta: u32) -> bool {
        self.tx.send(delta).is_ok()
    }
}

struct Inner {
    fetcher: Arc<dyn PageFetcher>,
    dispatch: Arc<dyn Dispatch>,
    visited: VisitedSet,
    results: mpsc::Sender<CrawlResult>,
    cancel: CancellationToken,
    extensions: Mutex<mpsc::UnboundedReceiver<u32>>,
    depth_control: DepthControl,
}

#[derive(Clone)]
pub struct Crawler {
    inner: Arc<Inner>,
}

impl Crawler {
    // Creates a crawler and the receiving end of its result stream
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        dispatch: Arc<dyn Dispatch>,
        cancel: CancellationToken,
    ) -> (Crawler, mpsc::Receiver<CrawlResult>) {
        // Capacity 1 is as close to a rendezvous channel as tokio gets
        let (results, rx) = mpsc::channel(1);
        let (depth_control, extensions) = DepthControl::channel();

        let crawler = Crawler {
            inner: Arc::new(Inner {
                fetcher,
                dispatch,
                visited: VisitedSet::new(),
                results,
                cancel,
                extensions: Mutex::new(extensions),
                depth_control,
            }),
        };
        (crawler, rx)
    }

    pub fn depth_control(&self) -> DepthControl {
        self.inner.depth_control.clone()
    }

    // Starts the root unit. Consumes the handle so that the result stream
    // closes as soon as the last unit is done.
    pub fn start(self, url: impl Into<String>, depth: u32) {
        let url = url.into();
        info!(url = %url, depth, "starting crawl");
        let root = self.scan(url, depth);
        self.inner.dispatch.dispatch(root);
    }

    // Boxing here gives the recursion a concrete type
    fn scan(&self, url: String, depth: u32) -> CrawlUnit {
        let crawler = self.clone();
        async move { crawler.visit(url, depth).await }.boxed()
    }

    async fn visit(&self, url: String, mut depth: u32) {
        let cancel = &self.inner.cancel;

        if cancel.is_cancelled() {
            trace!(url = %url, "aborted before start");
            return;
        }
        if depth == 0 {
            trace!(url = %url, "depth exhausted");
            return;
        }
        if !self.inner.visited.try_claim(&url) {
            trace!(url = %url, "already visited");
            return;
        }
        if cancel.is_cancelled() {
            trace!(url = %url, "aborted before fetch");
            return;
        }

        // One extension per unit; queued ones are left for the next units
        if let Some(delta) = self.take_extension() {
            depth = depth.saturating_add(delta);
            debug!(url = %url, delta, depth, "depth extended");
        }

        debug!(url = %url, depth, "fetching");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                trace!(url = %url, "aborted during fetch");
                return;
            }
            outcome = self.inner.fetcher.fetch(&url, cancel) => outcome,
        };

        let body = match outcome {
            Ok(FetchOutcome::Fetched(body)) => body,
            Ok(FetchOutcome::Skipped) => return,
            Err(error) => {
                self.emit(CrawlResult::Failure { error }).await;
                return;
            }
        };

        let page = match Page::parse(&url, &body) {
            Ok(page) => page,
            Err(error) => {
                self.emit(CrawlResult::Failure { error }).await;
                return;
            }
        };

        let emitted = self
            .emit(CrawlResult::Success {
                url: url.clone(),
                title: page.title().to_string(),
            })
            .await;
        if !emitted {
            return;
        }

        self.fan_out(&url, &page, depth - 1);
    }

    fn fan_out(&self, url: &str, page: &Page, depth: u32) {
        let base = Url::parse(url).ok();
        let mut started = 0;
        for href in page.links() {
            let link = match &base {
                Some(base) => resolve_link(base, href),
                None => Some(href.clone()),
            };
            if let Some(link) = link {
                self.inner.dispatch.dispatch(self.scan(link, depth));
                started += 1;
            }
        }
        trace!(url, started, depth, "fanned out");
    }

    // Waits for room on the result stream unless the crawl is cancelled first.
    // Returns false when the result was not delivered.
    async fn emit(&self, result: CrawlResult) -> bool {
        tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => false,
            sent = self.inner.results.send(result) => sent.is_ok(),
        }
    }

    fn take_extension(&self) -> Option<u32> {
        self.inner.extensions.lock().ok()?.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::dispatch::dispatcher;
    use crate::error::CrawlError;
    use crate::page::testing::StaticFetcher;
    use std::collections::HashSet;
    use std::time::Duration;

    fn crawler_for(fetcher: &Arc<StaticFetcher>) -> (Crawler, mpsc::Receiver<CrawlResult>) {
        let fetcher: Arc<dyn PageFetcher> = Arc::clone(fetcher) as Arc<dyn PageFetcher>;
        Crawler::new(fetcher, dispatcher(None), CancellationToken::new())
    }

    async fn collect(mut rx: mpsc::Receiver<CrawlResult>) -> Vec<CrawlResult> {
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    }

    fn success_urls(results: &[CrawlResult]) -> HashSet<String> {
        results
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.url().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_zero_depth_fetches_nothing() {
        let fetcher = Arc::new(StaticFetcher::new().page("https://site.test/", "Home", &[]));
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 0);

        assert!(collect(rx).await.is_empty());
        assert_eq!(fetcher.total_fetches(), 0);
    }

    #[tokio::test]
    async fn test_home_with_two_children() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/a", "https://site.test/b"])
                .page("https://site.test/a", "A", &[])
                .page("https://site.test/b", "B", &[]),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 2);
        let results = collect(rx).await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            success_urls(&results),
            HashSet::from([
                "https://site.test/".to_string(),
                "https://site.test/a".to_string(),
                "https://site.test/b".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_depth_limits_the_walk() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/a"])
                .page("https://site.test/a", "A", &["https://site.test/b"])
                .page("https://site.test/b", "B", &[]),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 2);
        let results = collect(rx).await;

        assert_eq!(results.len(), 2);
        assert_eq!(fetcher.fetch_count("https://site.test/b"), 0);
    }

    #[tokio::test]
    async fn test_self_loop_is_fetched_once() {
        let fetcher = Arc::new(StaticFetcher::new().page(
            "https://site.test/",
            "Home",
            &["https://site.test/", "https://site.test/"],
        ));
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 5);
        let results = collect(rx).await;

        assert_eq!(results.len(), 1);
        assert_eq!(fetcher.fetch_count("https://site.test/"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_links_are_fetched_once() {
        // Home -> A, B; A -> C, Home; B -> C
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/a", "https://site.test/b"])
                .page("https://site.test/a", "A", &["https://site.test/c", "https://site.test/"])
                .page("https://site.test/b", "B", &["https://site.test/c"])
                .page("https://site.test/c", "C", &[])
                .with_delay(Duration::from_millis(5)),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 3);
        let results = collect(rx).await;

        assert_eq!(results.len(), 4);
        for url in [
            "https://site.test/",
            "https://site.test/a",
            "https://site.test/b",
            "https://site.test/c",
        ] {
            assert_eq!(fetcher.fetch_count(url), 1, "{} fetched more than once", url);
        }
    }

    #[tokio::test]
    async fn test_failure_is_emitted_and_not_expanded() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/broken"])
                .failing("https://site.test/broken", 500),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 3);
        let results = collect(rx).await;

        assert_eq!(results.len(), 2);
        let failure = results.iter().find(|r| !r.is_success()).unwrap();
        assert!(matches!(
            failure,
            CrawlResult::Failure { error: CrawlError::Status { status: 500, .. } }
        ));
        assert_eq!(failure.url(), "https://site.test/broken");
    }

    #[tokio::test]
    async fn test_unparseable_page_is_a_failure() {
        let fetcher = Arc::new(StaticFetcher::new().bytes("https://site.test/", &[0xff, 0xfe]));
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/", 1);
        let results = collect(rx).await;

        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            CrawlResult::Failure { error: CrawlError::Parse { .. } }
        ));
    }

    #[tokio::test]
    async fn test_relative_links_are_resolved() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/docs/", "Docs", &["intro", "/about", "mailto:x@site.test"])
                .page("https://site.test/docs/intro", "Intro", &[])
                .page("https://site.test/about", "About", &[]),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        crawler.start("https://site.test/docs/", 2);
        let results = collect(rx).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(CrawlResult::is_success));
    }

    #[tokio::test]
    async fn test_extension_raises_one_units_depth() {
        // Chain: Home -> A -> B -> C
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/a"])
                .page("https://site.test/a", "A", &["https://site.test/b"])
                .page("https://site.test/b", "B", &["https://site.test/c"])
                .page("https://site.test/c", "C", &[]),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        // Picked up by the root unit only: depth 1 + 1 reaches A but not B
        assert!(crawler.depth_control().extend(1));
        crawler.start("https://site.test/", 1);
        let results = collect(rx).await;

        assert_eq!(
            success_urls(&results),
            HashSet::from(["https://site.test/".to_string(), "https://site.test/a".to_string()])
        );
        assert_eq!(fetcher.fetch_count("https://site.test/b"), 0);
    }

    #[tokio::test]
    async fn test_queued_extensions_spread_across_units() {
        // Chain: Home -> A -> B -> C
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/a"])
                .page("https://site.test/a", "A", &["https://site.test/b"])
                .page("https://site.test/b", "B", &["https://site.test/c"])
                .page("https://site.test/c", "C", &[]),
        );
        let (crawler, rx) = crawler_for(&fetcher);

        // Home takes the first (depth 2), A takes the second (depth 1 + 1)
        let depth = crawler.depth_control();
        assert!(depth.extend(1));
        assert!(depth.extend(1));
        crawler.start("https://site.test/", 1);
        let results = collect(rx).await;

        assert_eq!(results.len(), 3);
        assert_eq!(fetcher.fetch_count("https://site.test/b"), 1);
        assert_eq!(fetcher.fetch_count("https://site.test/c"), 0);
    }

    #[tokio::test]
    async fn test_cancelled_crawl_fetches_nothing() {
        let fetcher = Arc::new(StaticFetcher::new().page("https://site.test/", "Home", &[]));
        let cancel = CancellationToken::new();
        let (crawler, rx) = Crawler::new(
            Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
            dispatcher(None),
            cancel.clone(),
        );

        cancel.cancel();
        crawler.start("https://site.test/", 3);

        assert!(collect(rx).await.is_empty());
        assert_eq!(fetcher.total_fetches(), 0);
    }

    #[tokio::test]
    async fn test_bounded_dispatch_gives_same_pages() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://site.test/", "Home", &["https://site.test/a", "https://site.test/b"])
                .page("https://site.test/a", "A", &["https://site.test/b"])
                .page("https://site.test/b", "B", &["https://site.test/a"]),
        );
        let (crawler, rx) = Crawler::new(
            Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
            dispatcher(Some(1)),
            CancellationToken::new(),
        );

        crawler.start("https://site.test/", 3);
        let results = collect(rx).await;

        assert_eq!(results.len(), 3);
        assert_eq!(fetcher.total_fetches(), 3);
    }
}
