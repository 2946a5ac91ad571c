//! Source-site scraping: listing pages in, [`PostCandidate`]s out.
//!
//! Scraping follows a two-step pattern per page:
//!
//! 1. **Fetching**: GET `{source}/page/{n}/` ([`listing::fetch_page`])
//! 2. **Extracting**: turn each `<article>` into a candidate ([`listing::extract_posts`])
//!
//! [`scrape_paginated`] drives that loop from page 1 until the site runs out
//! of pages. Pages are fetched strictly one after another since each page
//! decides whether there is a next one.

pub mod listing;

use crate::models::PostCandidate;
use listing::{PageFetch, extract_posts, fetch_page};
use reqwest::Client;
use std::fmt;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Why pagination stopped. Each variant carries the page number involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page was fetched but had no extractable articles.
    EmptyPage(u32),
    /// The page returned 404.
    NotFound(u32),
    /// The page could not be fetched.
    FetchFailed(u32),
    /// The configured page cap was reached.
    PageCap(u32),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EmptyPage(n) => write!(f, "page {n} had no posts"),
            StopReason::NotFound(n) => write!(f, "page {n} not found"),
            StopReason::FetchFailed(n) => write!(f, "page {n} could not be fetched"),
            StopReason::PageCap(n) => write!(f, "page cap of {n} reached"),
        }
    }
}

/// Everything collected in one pagination pass.
#[derive(Debug)]
pub struct ScrapeReport {
    /// Candidates from all pages, in discovery order.
    pub candidates: Vec<PostCandidate>,
    /// Number of page requests issued.
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// URL of listing page `page` under `source_url`.
pub fn page_url(source_url: &str, page: u32) -> String {
    format!("{}/page/{}/", source_url.trim_end_matches('/'), page)
}

/// Scrape listing pages starting at 1 until one yields no posts.
///
/// Also stops on a 404, on a failed fetch, or once `max_pages` pages have
/// been fetched. A page whose articles all fail extraction looks the same as
/// the end of the listing and stops the walk too.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `source_url` - Site root; pages are requested at `{source_url}/page/N/`
/// * `max_pages` - Page cap, or `None` for no cap
///
/// # Returns
///
/// A [`ScrapeReport`] with every candidate in page order, the number of
/// pages fetched and why the walk stopped. Fetch failures end the walk and
/// are reported through [`StopReason`], never as an error.
#[instrument(level = "info", skip(client))]
pub async fn scrape_paginated(
    client: &Client,
    source_url: &str,
    max_pages: Option<u32>,
) -> ScrapeReport {
    let mut candidates = Vec::new();
    let mut pages_fetched = 0u32;
    let mut page = 1u32;

    let stop = loop {
        if let Some(cap) = max_pages {
            if page > cap {
                break StopReason::PageCap(cap);
            }
        }

        let url = page_url(source_url, page);
        let base = match Url::parse(&url) {
            Ok(base) => base,
            Err(e) => {
                error!(%url, error = %e, "Invalid page URL");
                break StopReason::FetchFailed(page);
            }
        };

        info!(page, %url, "Scraping page");
        pages_fetched += 1;

        let posts = match fetch_page(client, &url).await {
            Ok(PageFetch::Body(html)) => extract_posts(&html, &base),
            Ok(PageFetch::NotFound) => {
                info!(page, "Page not found. Stopping pagination.");
                break StopReason::NotFound(page);
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to fetch page. Stopping pagination.");
                break StopReason::FetchFailed(page);
            }
        };

        if posts.is_empty() {
            info!(page, "No more posts found. Stopping pagination.");
            break StopReason::EmptyPage(page);
        }

        candidates.extend(posts);
        page += 1;
    };

    info!(
        pages_fetched,
        candidates = candidates.len(),
        stop = %stop,
        "Pagination finished"
    );
    ScrapeReport {
        candidates,
        pages_fetched,
        stop,
    }
}
