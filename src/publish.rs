//! Republishing candidates as WordPress posts.
//!
//! Each candidate moves through:
//!
//! ```text
//! Candidate ─┬─> Skipped                       (already published)
//!            └─> image upload (if any) ─> post ─┬─> Published
//!                                               └─> Failed
//! ```
//!
//! An image problem never stops the post; the post is created without a
//! featured image. A failed post is logged with status and body and left
//! alone. Nothing here is retried and nothing is returned as an error, so one
//! bad candidate can't take the rest of the batch down with it.
//!
//! Successful posts are recorded in the [`Ledger`] whichever dedupe strategy
//! is active.

use crate::api::WpClient;
use crate::dedupe::DuplicateCheck;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{NewPost, PostCandidate};
use crate::utils::{filename_from_url, image_content_type};
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Already published; no request was made.
    Skipped,
    /// `post_id` is `None` when WordPress confirmed creation but its response
    /// body was unreadable.
    Published {
        post_id: Option<u64>,
        media_id: Option<u64>,
    },
    Failed,
}

/// Counts of outcomes over a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PublishSummary {
    fn add(mut self, outcome: &PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::Skipped => self.skipped += 1,
            PublishOutcome::Published { .. } => self.published += 1,
            PublishOutcome::Failed => self.failed += 1,
        }
        self
    }
}

#[derive(Debug)]
pub struct Publisher<'a, D> {
    client: &'a WpClient,
    ledger: &'a Ledger,
    dedupe: &'a D,
    send_taxonomy: bool,
}

impl<'a, D: DuplicateCheck> Publisher<'a, D> {
    pub fn new(
        client: &'a WpClient,
        ledger: &'a Ledger,
        dedupe: &'a D,
        send_taxonomy: bool,
    ) -> Self {
        Self {
            client,
            ledger,
            dedupe,
            send_taxonomy,
        }
    }

    /// Publish one candidate unless it is a duplicate.
    #[instrument(
        level = "info",
        skip_all,
        fields(title = %candidate.title, link = %candidate.link)
    )]
    pub async fn publish(&self, candidate: &PostCandidate) -> PublishOutcome {
        if self.dedupe.already_published(candidate).await {
            info!("Post already exists. Skipping.");
            return PublishOutcome::Skipped;
        }

        let media_id = match &candidate.image_url {
            Some(url) => match self.upload_featured_image(url).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(
                        image_url = %url,
                        error = %e,
                        "Image upload failed; publishing without featured image"
                    );
                    None
                }
            },
            None => None,
        };

        let post = NewPost::publish(candidate, media_id, self.send_taxonomy);
        match self.client.create_post(&post).await {
            Ok(created) => {
                let post_id = created.as_ref().map(|c| c.id);
                info!(
                    ?post_id,
                    ?media_id,
                    remote_link = ?created.as_ref().and_then(|c| c.link.as_deref()),
                    "Post created successfully"
                );
                if let Err(e) = self.ledger.record(&candidate.link).await {
                    error!(
                        path = %self.ledger.path().display(),
                        error = %e,
                        "Post was created but could not be recorded in the ledger"
                    );
                }
                PublishOutcome::Published { post_id, media_id }
            }
            Err(e) => {
                error!(error = %e, "Failed to create post");
                PublishOutcome::Failed
            }
        }
    }

    async fn upload_featured_image(&self, image_url: &str) -> Result<u64> {
        let image = self.client.fetch_image(image_url).await?;
        let filename = filename_from_url(image_url);
        let content_type = image_content_type(image.content_type.as_deref(), &filename);
        self.client
            .upload_media(image.bytes, &filename, &content_type)
            .await
    }

    /// Publish every candidate, at most `concurrency` at a time.
    ///
    /// With `concurrency == 1` candidates go out one by one in order. Above
    /// that, completion order is unspecified.
    #[instrument(
        level = "info",
        skip_all,
        fields(candidates = candidates.len(), concurrency = concurrency)
    )]
    pub async fn publish_all(
        &self,
        candidates: &[PostCandidate],
        concurrency: usize,
    ) -> PublishSummary {
        let outcomes: Vec<PublishOutcome> = stream::iter(candidates)
            .map(|candidate| self.publish(candidate))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let summary = outcomes
            .iter()
            .fold(PublishSummary::default(), PublishSummary::add);
        info!(
            published = summary.published,
            skipped = summary.skipped,
            failed = summary.failed,
            "Publishing finished"
        );
        summary
    }
}
