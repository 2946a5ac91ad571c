//! # wp_repost
//!
//! Scrapes article teasers from a source site's paginated listing and
//! republishes each one as a post on a WordPress site through its REST API,
//! skipping anything that was already republished.
//!
//! ## Usage
//!
//! ```sh
//! WP_TOKEN=... wp_repost -s https://readforlearn.com --api-base https://blog.example/wp-json/wp/v2
//! ```
//!
//! ## Architecture
//!
//! Each run is one linear cycle:
//! 1. **Scraping**: fetch `/page/1/`, `/page/2/`, … until a page has no articles
//! 2. **Extracting**: pull title, link, excerpt, image, categories and tags out of each `<article>`
//! 3. **Deduping**: check each candidate against the ledger (or a remote title search)
//! 4. **Publishing**: upload the featured image, create the post, record the link
//!    (concurrent, `--concurrency` at a time)
//!
//! Per-item failures are logged and never abort the run; only bad
//! configuration or an unusable ledger file does.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dedupe;
mod error;
mod ledger;
mod models;
mod pipeline;
mod publish;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "wp_repost starting up");

    let args = Cli::parse();
    debug!(config_file = ?args.config, "Parsed CLI arguments");

    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        source = %config.source_url,
        api_base = %config.api_base,
        ledger = %config.ledger_path.display(),
        dedupe = ?config.dedupe,
        concurrency = config.concurrency,
        "Configuration loaded"
    );

    let summary = match pipeline::run(&config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run aborted");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        pages = summary.pages_fetched,
        stop = %summary.stop,
        published = summary.publish.published,
        skipped = summary.publish.skipped,
        failed = summary.publish.failed,
        "Execution complete"
    );

    Ok(())
}
