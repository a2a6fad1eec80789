// src/crawl/dispatch.rs
// =============================================================================
// How new crawl units get started.
//
// The crawler never calls tokio::spawn itself, it hands each unit to a
// Dispatch. Two are provided:
// - Unbounded: one tokio task per discovered link, no cap (the default)
// - Bounded: still one task per link, but only N of them may be doing work
//   at the same time; the rest wait on a semaphore
//
// Either way dispatch() returns immediately: fan-out is fire-and-forget.
// =============================================================================

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Semaphore;

/// One crawl unit, ready to run
pub type CrawlUnit = BoxFuture<'static, ()>;

pub trait Dispatch: Send + Sync {
    fn dispatch(&self, unit: CrawlUnit);
}

pub struct Unbounded;

impl Dispatch for Unbounded {
    fn dispatch(&self, unit: CrawlUnit) {
        tokio::spawn(unit);
    }
}

pub struct Bounded {
    permits: Arc<Semaphore>,
}

impl Bounded {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
        }
    }
}

impl Dispatch for Bounded {
    fn dispatch(&self, unit: CrawlUnit) {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // The semaphore is never closed, so acquiring only fails if that changes
            if let Ok(_permit) = permits.acquire_owned().await {
                unit.await;
            }
        });
    }
}

// Picks the dispatcher for a configured cap (None = unbounded)
pub fn dispatcher(max_in_flight: Option<usize>) -> Arc<dyn Dispatch> {
    match max_in_flight {
        Some(limit) => Arc::new(Bounded::new(limit)),
        None => Arc::new(Unbounded),
    }
}
