// src/visited.rs
// =============================================================================
// The set of URLs this crawl has already claimed.
//
// Many crawl units discover links at the same time, and two of them may find
// the same URL in the same instant. Checking "have we seen it?" and then
// writing "we have now" as two steps lets both of them through. So there is
// exactly one operation, try_claim, and it does both under one shard lock.
//
// DashSet is a sharded concurrent hash set: reads and writes to different
// shards never wait on each other.
// =============================================================================

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns true if the caller now owns `url`, false if someone claimed it first
    pub fn try_claim(&self, url: &str) -> bool {
        // insert() is a single check-and-set under the shard's write lock
        self.urls.insert(url.to_string())
    }
}
