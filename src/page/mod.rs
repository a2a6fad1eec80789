// src/page/mod.rs
// =============================================================================
// Everything the crawler needs to know about a single page.
//
// Submodules:
// - fetch: turns a URL into raw bytes (PageFetcher trait + the reqwest one)
// - model: turns raw bytes into a title and a list of links (PageModel)
//
// The crawler only talks to these two seams, which is what lets the tests
// swap the network for an in-memory site.
// =============================================================================

mod fetch;
mod model;

pub use fetch::{FetchOutcome, HttpFetcher, PageFetcher};
pub use model::{resolve_link, Page};

#[cfg(test)]
pub use fetch::testing;
