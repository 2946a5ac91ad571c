//! Data models for scraped candidates and the WordPress REST payloads.
//!
//! - [`PostCandidate`]: one `article` element pulled off a listing page
//! - [`NewPost`]: body of `POST /posts`
//! - [`CreatedPost`], [`CreatedMedia`], [`SearchHit`]: the parts of WordPress
//!   responses the pipeline reads

use serde::{Deserialize, Serialize};

/// A post extracted from source markup, not yet checked or published.
///
/// `title` and `link` are always non-empty; the extractor drops items that
/// would violate that. `link` is the dedupe key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCandidate {
    pub title: String,
    /// Absolute URL of the source article.
    pub link: String,
    /// Plain-text excerpt used as the post body.
    pub description: String,
    /// Absolute URL of the listing image, if the article had one.
    pub image_url: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// Request body for creating a post.
///
/// Optional fields are left out of the JSON entirely when they carry nothing,
/// so a post whose image upload failed simply has no `featured_media`.
#[derive(Debug, Serialize)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a [String]>,
}

impl<'a> NewPost<'a> {
    /// Build an auto-published post for `candidate`.
    ///
    /// Categories and tags are attached only when `with_taxonomy` is set and
    /// the candidate actually has some.
    pub fn publish(
        candidate: &'a PostCandidate,
        featured_media: Option<u64>,
        with_taxonomy: bool,
    ) -> Self {
        let non_empty = |v: &'a [String]| (with_taxonomy && !v.is_empty()).then_some(v);
        Self {
            title: &candidate.title,
            content: &candidate.description,
            status: "publish",
            featured_media,
            categories: non_empty(&candidate.categories),
            tags: non_empty(&candidate.tags),
        }
    }
}

/// Response of a successful `POST /posts`.
#[derive(Debug, Deserialize)]
pub struct CreatedPost {
    pub id: u64,
    #[serde(default)]
    pub link: Option<String>,
}

/// Response of a successful `POST /media`.
#[derive(Debug, Deserialize)]
pub struct CreatedMedia {
    pub id: u64,
}

/// One item of the `GET /posts?search=` response.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: Rendered,
}

/// WordPress wraps rendered strings as `{"rendered": "..."}`.
#[derive(Debug, Deserialize)]
pub struct Rendered {
    pub rendered: String,
}
