//! Listing page fetcher and article extractor.
//!
//! A listing page is any page of the source site that carries a run of
//! `<article>` teasers, e.g. `https://readforlearn.com/page/2/`. Each teaser is
//! expected to look roughly like:
//!
//! ```html
//! <article>
//!   <img src="/uploads/cover.jpg">
//!   <h2><a href="/some-post/">Post title</a></h2>
//!   <p>Short excerpt…</p>
//!   <a class="category" href="/category/java/">Java</a>
//!   <a class="tag" href="/tag/arrays/">arrays</a>
//! </article>
//! ```
//!
//! Relative `href`/`src` values are resolved against the page URL.

use crate::error::{RelayError, Result};
use crate::models::PostCandidate;
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static CATEGORY: Lazy<Selector> = Lazy::new(|| Selector::parse("a.category").unwrap());
static TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("a.tag").unwrap());

/// Result of fetching one listing page.
#[derive(Debug)]
pub enum PageFetch {
    /// HTTP 200 with the page markup.
    Body(String),
    /// HTTP 404; the site has no page with this number.
    NotFound,
}

/// Fetch a listing page.
///
/// Only 200 counts as success. A 404 is reported separately so pagination
/// can tell "past the last page" apart from a broken request; every other
/// status is a [`RelayError::Fetch`].
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `url` - Absolute URL of the listing page
///
/// # Returns
///
/// [`PageFetch::Body`] on 200, [`PageFetch::NotFound`] on 404, or an error
/// for any other status or a transport failure.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_page(client: &Client, url: &str) -> Result<PageFetch> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        debug!("Page not found");
        return Ok(PageFetch::NotFound);
    }
    if status != StatusCode::OK {
        return Err(RelayError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(PageFetch::Body(body))
}

/// Extract every top-level `<article>` on the page, in document order.
///
/// Articles missing a title or link are logged and skipped; they never fail
/// the page.
///
/// # Arguments
///
/// * `html` - Raw markup of one listing page
/// * `page_url` - URL the page was fetched from, used to resolve relative
///   links and image sources
///
/// # Returns
///
/// The well-formed candidates, possibly empty.
pub fn extract_posts(html: &str, page_url: &Url) -> Vec<PostCandidate> {
    let document = Html::parse_document(html);
    let mut posts = Vec::new();
    let mut skipped = 0usize;

    for (index, article) in document
        .select(&ARTICLE)
        .filter(|a| !is_nested_article(a))
        .enumerate()
    {
        match extract_post(article, page_url) {
            Ok(post) => posts.push(post),
            Err(e) => {
                skipped += 1;
                warn!(index, error = %e, "Error extracting post data; skipping article");
            }
        }
    }

    info!(count = posts.len(), skipped, page = %page_url, "Extracted posts");
    posts
}

fn is_nested_article(article: &ElementRef) -> bool {
    article
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "article")
}

fn extract_post(article: ElementRef, page_url: &Url) -> Result<PostCandidate> {
    let heading = article
        .select(&HEADING)
        .next()
        .ok_or(RelayError::Extraction("title"))?;
    let title = text_of(heading);
    if title.is_empty() {
        return Err(RelayError::Extraction("title"));
    }

    // Prefer the heading's own link so a leading category anchor isn't taken
    // for the post URL.
    let href = heading
        .select(&ANCHOR)
        .next()
        .or_else(|| article.select(&ANCHOR).next())
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or(RelayError::Extraction("link"))?;
    let link = page_url
        .join(href)
        .map_err(|_| RelayError::Extraction("link"))?
        .to_string();

    let description = article
        .select(&PARAGRAPH)
        .next()
        .map(text_of)
        .unwrap_or_default();

    let image_url = article
        .select(&IMAGE)
        .next()
        .and_then(|img| {
            let value = img.value();
            value
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| value.attr("data-src"))
        })
        .and_then(|src| page_url.join(src.trim()).ok())
        .map(|u| u.to_string());

    Ok(PostCandidate {
        title,
        link,
        description,
        image_url,
        categories: texts_of(article, &CATEGORY),
        tags: texts_of(article, &TAG),
    })
}

fn text_of(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn texts_of(article: ElementRef, selector: &Selector) -> Vec<String> {
    article
        .select(selector)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
          <article>
            <img src="/uploads/first.jpg">
            <h2><a href="/first-post/">First   post</a></h2>
            <p>First excerpt.</p>
            <a class="category" href="/category/java/">Java</a>
            <a class="tag" href="/tag/arrays/">arrays</a>
            <a class="tag" href="/tag/loops/">loops</a>
          </article>
          <article>
            <a href="/no-title/">Read more</a>
            <p>This one has no heading.</p>
          </article>
          <article>
            <h2><a href="https://other.example/second-post/">Second post</a></h2>
            <p>Second
               excerpt.</p>
          </article>
        </body></html>
    "#;

    fn page() -> Url {
        Url::parse("https://source.example/page/1/").unwrap()
    }

    #[test]
    fn test_extract_skips_malformed_and_keeps_order() {
        let posts = extract_posts(FIXTURE, &page());
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "First post");
        assert_eq!(posts[1].title, "Second post");
    }

    #[test]
    fn test_extract_resolves_relative_urls() {
        let posts = extract_posts(FIXTURE, &page());
        assert_eq!(posts[0].link, "https://source.example/first-post/");
        assert_eq!(
            posts[0].image_url.as_deref(),
            Some("https://source.example/uploads/first.jpg")
        );
        assert_eq!(posts[1].link, "https://other.example/second-post/");
        assert_eq!(posts[1].image_url, None);
    }

    #[test]
    fn test_extract_fields() {
        let posts = extract_posts(FIXTURE, &page());
        assert_eq!(posts[0].description, "First excerpt.");
        assert_eq!(posts[0].categories, vec!["Java"]);
        assert_eq!(posts[0].tags, vec!["arrays", "loops"]);
        assert_eq!(posts[1].description, "Second excerpt.");
        assert!(posts[1].categories.is_empty());
    }

    #[test]
    fn test_heading_link_preferred_over_leading_anchor() {
        let html = r#"<article>
            <a class="category" href="/category/news/">News</a>
            <h2><a href="/the-post/">The post</a></h2>
        </article>"#;
        let posts = extract_posts(html, &page());
        assert_eq!(posts[0].link, "https://source.example/the-post/");
        assert_eq!(posts[0].description, "");
    }

    #[test]
    fn test_missing_link_is_skipped() {
        let html = "<article><h2>No link here</h2><p>text</p></article>";
        assert!(extract_posts(html, &page()).is_empty());
    }

    #[test]
    fn test_lazy_loaded_image() {
        let html = r#"<article>
            <img src="" data-src="https://cdn.example/lazy.png">
            <h2><a href="/p/">P</a></h2>
        </article>"#;
        let posts = extract_posts(html, &page());
        assert_eq!(
            posts[0].image_url.as_deref(),
            Some("https://cdn.example/lazy.png")
        );
    }

    #[test]
    fn test_nested_articles_are_not_double_counted() {
        let html = r#"<article>
            <h2><a href="/outer/">Outer</a></h2>
            <article><h3><a href="/inner/">Inner</a></h3></article>
        </article>"#;
        let posts = extract_posts(html, &page());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Outer");
    }

    #[test]
    fn test_page_without_articles() {
        assert!(extract_posts("<html><body><p>nothing</p></body></html>", &page()).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/page/1/")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let url = format!("{}/page/1/", server.url());
        let fetched = fetch_page(&Client::new(), &url).await.unwrap();
        assert!(matches!(fetched, PageFetch::Body(ref b) if b == "<html></html>"));
    }

    #[tokio::test]
    async fn test_fetch_page_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/page/9/")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/page/9/", server.url());
        let fetched = fetch_page(&Client::new(), &url).await.unwrap();
        assert!(matches!(fetched, PageFetch::NotFound));
    }

    #[tokio::test]
    async fn test_fetch_page_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/page/1/")
            .with_status(503)
            .create_async()
            .await;

        let url = format!("{}/page/1/", server.url());
        let err = fetch_page(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, RelayError::Fetch { status: 503, .. }));
    }
}
