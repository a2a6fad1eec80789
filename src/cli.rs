// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Everything here is raw user input. It gets checked and turned into a
// `Config` (see src/config.rs) before the crawler ever sees it.
//
// Runtime control does not go through flags: once the crawl is running you
// steer it with signals.
//   SIGINT  (Ctrl-C)             -> stop the crawl gracefully
//   SIGUSR1 (kill -USR1 <pid>)   -> give the crawl `--extend-by` more depth
// =============================================================================

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "depth-crawler",
    version = "0.1.0",
    about = "Crawl a website to a bounded depth, printing the title of every page found",
    long_about = "depth-crawler follows links from a start page, one concurrent task per link, \
                  never visiting the same url twice. It stops when it runs out of pages, \
                  hits the result or error quota, or is interrupted."
)]
pub struct Cli {
    /// URL to start crawling from
    ///
    /// This is a positional argument (optional, has a default)
    #[arg(default_value = "https://telegram.org")]
    pub start_url: String,

    /// How many link hops to follow (1 = just the start page)
    #[arg(long, default_value_t = 3)]
    pub max_depth: u32,

    /// Stop after this many pages were crawled successfully
    #[arg(long, default_value_t = 10)]
    pub max_results: usize,

    /// Stop after this many fetch or parse errors
    #[arg(long, default_value_t = 5)]
    pub max_errors: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Depth added each time SIGUSR1 is received
    #[arg(long, default_value_t = 2)]
    pub extend_by: u32,

    /// Stop the whole crawl after this many seconds
    #[arg(long)]
    pub max_runtime: Option<u64>,

    /// Cap how many pages may be in flight at once (default: no cap)
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Output the crawl summary as JSON
    #[arg(long)]
    pub json: bool,
}
