//! One scrape-and-republish cycle.
//!
//! 1. **Scraping**: walk the source's listing pages ([`scrape_paginated`])
//! 2. **Collapsing**: drop links seen earlier in the same cycle
//! 3. **Publishing**: dedupe-check and publish each candidate ([`Publisher`])
//!
//! Only setup can fail a run (building the HTTP client, opening the ledger).
//! Everything after that is contained and shows up in the [`RunSummary`].

use crate::api::WpClient;
use crate::config::Config;
use crate::dedupe::Dedupe;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::publish::{PublishSummary, Publisher};
use crate::scrapers::{StopReason, scrape_paginated};
use itertools::Itertools;
use tracing::{info, instrument};

/// What one run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_fetched: u32,
    pub stop: StopReason,
    /// Distinct candidates found across all pages.
    pub candidates: usize,
    pub publish: PublishSummary,
}

/// Run one full cycle with `config`.
#[instrument(
    level = "info",
    skip_all,
    fields(source = %config.source_url, dedupe = ?config.dedupe)
)]
pub async fn run(config: &Config) -> Result<RunSummary> {
    let client = WpClient::new(config)?;
    let ledger = Ledger::open(&config.ledger_path).await?;
    run_with(config, &client, &ledger).await
}

/// Run one cycle against an already built client and ledger.
pub async fn run_with(config: &Config, client: &WpClient, ledger: &Ledger) -> Result<RunSummary> {
    let report = scrape_paginated(client.http(), &config.source_url, config.page_cap()).await;

    let found = report.candidates.len();
    let candidates = report
        .candidates
        .into_iter()
        .unique_by(|c| c.link.clone())
        .collect::<Vec<_>>();
    if candidates.len() < found {
        info!(
            dropped = found - candidates.len(),
            "Dropped candidates repeated within this cycle"
        );
    }

    let publish = if candidates.is_empty() {
        info!("No posts found to publish");
        PublishSummary::default()
    } else {
        let dedupe = Dedupe::new(config.dedupe, ledger, client);
        let publisher = Publisher::new(client, ledger, &dedupe, config.send_taxonomy);
        publisher.publish_all(&candidates, config.concurrency).await
    };

    let summary = RunSummary {
        pages_fetched: report.pages_fetched,
        stop: report.stop,
        candidates: candidates.len(),
        publish,
    };
    let ledger_entries = ledger.len().await;
    info!(
        pages_fetched = summary.pages_fetched,
        candidates = summary.candidates,
        published = publish.published,
        skipped = publish.skipped,
        failed = publish.failed,
        ledger_entries,
        "Cycle complete"
    );
    Ok(summary)
}
