// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, default "info")
// 2. Parse command-line arguments and validate them into a Config
// 3. Hook SIGINT / SIGUSR1 up to the crawl's control loop
// 4. Run the crawl and print a summary (table or JSON)
// 5. Exit with proper code (0 = crawl ended cleanly, 2 = error)
//
// A crawl that stops because of a quota and one that stops because you hit
// Ctrl-C are both clean shutdowns: the log says which one it was.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - validated crawl settings
mod control; // src/control/ - terminate / extend-depth handling
mod crawl; // src/crawl/ - the crawler, its dispatchers and the result consumer
mod error; // src/error.rs - error types
mod page; // src/page/ - fetching and reading pages
mod visited; // src/visited.rs - the set of urls already claimed

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use crawl::{CrawlResult, CrawlSummary};
use page::HttpFetcher;

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays machine-readable
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let json = cli.json;
    let config = Config::try_from(cli)?;

    let fetcher = HttpFetcher::new(config.timeout).context("failed to build HTTP client")?;

    let (events_tx, events_rx) = mpsc::channel(8);
    control::spawn_signal_listener(events_tx).context("failed to install signal handlers")?;

    if !json {
        println!("🔍 Crawling: {}", config.start_url);
        println!(
            "📊 Max depth: {}, max results: {}, max errors: {}",
            config.max_depth, config.max_results, config.max_errors
        );
        println!("   (Ctrl-C stops, SIGUSR1 adds {} to the depth)\n", config.extend_by);
    }

    let summary = crawl::run(&config, Arc::new(fetcher), events_rx).await;

    print_summary(&summary, json)?;
    Ok(0)
}

// Prints the summary either as a table or JSON
fn print_summary(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(summary)?;
        println!("{}", json_output);
    } else {
        print_table(summary);
    }
    Ok(())
}

fn print_table(summary: &CrawlSummary) {
    println!("\n{:<60} {:<40}", "URL", "TITLE / ERROR");
    println!("{}", "=".repeat(100));

    for result in &summary.results {
        let detail = match result {
            CrawlResult::Success { title, .. } => format!("✅ {}", title),
            CrawlResult::Failure { error } => format!("❌ {}", error),
        };
        println!("{:<60} {:<40}", truncate(result.url(), 57), detail);
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Pages: {}", summary.successes);
    println!("   ❌ Errors: {}", summary.failures);
    println!("   🛑 Stopped: {}", summary.stop);
}

// Shortens long urls for display without splitting a UTF-8 character
fn truncate(url: &str, max: usize) -> String {
    if url.chars().count() > max {
        let short: String = url.chars().take(max).collect();
        format!("{}...", short)
    } else {
        url.to_string()
    }
}
