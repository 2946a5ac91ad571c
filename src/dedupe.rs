//! Duplicate detection ahead of publishing.
//!
//! Two strategies implement [`DuplicateCheck`]; a run uses exactly one of them
//! via [`Dedupe`]:
//!
//! - [`LedgerCheck`] looks the candidate's link up in the local [`Ledger`].
//!   This is the default and the one to trust.
//! - [`RemoteSearchCheck`] asks WordPress for posts matching the title and
//!   compares rendered titles exactly. Titles WordPress re-encodes (`&` to
//!   `&amp;`, curly quotes) won't match, so it errs towards republishing.
//!
//! Neither check ever fails: a remote error is logged and treated as
//! "not published".

use crate::api::WpClient;
use crate::config::DedupeStrategy;
use crate::ledger::Ledger;
use crate::models::PostCandidate;
use tracing::{debug, warn};

/// Decides whether a candidate has already been republished.
pub trait DuplicateCheck {
    async fn already_published(&self, candidate: &PostCandidate) -> bool;
}

/// Ledger lookup by link.
#[derive(Debug)]
pub struct LedgerCheck<'a> {
    ledger: &'a Ledger,
}

impl<'a> LedgerCheck<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }
}

impl DuplicateCheck for LedgerCheck<'_> {
    async fn already_published(&self, candidate: &PostCandidate) -> bool {
        self.ledger.contains(&candidate.link).await
    }
}

/// Exact rendered-title match against the remote search endpoint.
#[derive(Debug)]
pub struct RemoteSearchCheck<'a> {
    client: &'a WpClient,
}

impl<'a> RemoteSearchCheck<'a> {
    pub fn new(client: &'a WpClient) -> Self {
        Self { client }
    }
}

impl DuplicateCheck for RemoteSearchCheck<'_> {
    async fn already_published(&self, candidate: &PostCandidate) -> bool {
        match self.client.search_posts(&candidate.title).await {
            Ok(hits) => {
                let matched = hits.iter().find(|h| h.title.rendered == candidate.title);
                debug!(
                    title = %candidate.title,
                    hits = hits.len(),
                    matched_id = ?matched.map(|h| h.id),
                    "Remote title search"
                );
                matched.is_some()
            }
            Err(e) => {
                warn!(
                    title = %candidate.title,
                    error = %e,
                    "Failed to check existing posts; assuming not published"
                );
                false
            }
        }
    }
}

/// The strategy selected for a run.
#[derive(Debug)]
pub enum Dedupe<'a> {
    Ledger(LedgerCheck<'a>),
    RemoteSearch(RemoteSearchCheck<'a>),
}

impl<'a> Dedupe<'a> {
    pub fn new(strategy: DedupeStrategy, ledger: &'a Ledger, client: &'a WpClient) -> Self {
        match strategy {
            DedupeStrategy::Ledger => Dedupe::Ledger(LedgerCheck::new(ledger)),
            DedupeStrategy::RemoteSearch => Dedupe::RemoteSearch(RemoteSearchCheck::new(client)),
        }
    }
}

impl DuplicateCheck for Dedupe<'_> {
    async fn already_published(&self, candidate: &PostCandidate) -> bool {
        match self {
            Dedupe::Ledger(check) => check.already_published(candidate).await,
            Dedupe::RemoteSearch(check) => check.already_published(candidate).await,
        }
    }
}
