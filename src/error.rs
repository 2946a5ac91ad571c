//! Error types for the scrape-and-republish pipeline.
//!
//! Most of these never escape the unit they happen in: a failed page stops
//! pagination, a malformed article is skipped, a failed image upload drops the
//! featured image, and a failed post creation ends that candidate only. The
//! only errors `main` ever sees are configuration and ledger-open failures.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A page or image request returned a non-success status.
    #[error("fetch of {url} failed with status {status}")]
    Fetch { url: String, status: u16 },

    /// An `article` element was missing a required field.
    #[error("article is missing its {0}")]
    Extraction(&'static str),

    /// The remote title search returned a non-success status.
    #[error("duplicate search failed with status {status}")]
    DuplicateCheck { status: u16 },

    /// Post creation did not return 201.
    #[error("post creation failed with status {status}: {body}")]
    Publish { status: u16, body: String },

    /// Media upload did not return 201.
    #[error("media upload failed with status {status}: {body}")]
    ImageUpload { status: u16, body: String },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RelayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
