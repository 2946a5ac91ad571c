//! WordPress REST API client.
//!
//! Thin wrapper over one shared [`reqwest::Client`] that knows the posts and
//! media endpoints and the bearer token. Requests are sent once; there is no
//! retry or backoff, callers decide what a failure means for them.
//!
//! | Call | Endpoint | Success |
//! |------|----------|---------|
//! | [`WpClient::search_posts`] | `GET {api_base}/posts?search=` | 200 |
//! | [`WpClient::upload_media`] | `POST {media_api_base}/media` | 201 |
//! | [`WpClient::create_post`] | `POST {api_base}/posts` | 201 |
//!
//! [`WpClient::fetch_image`] downloads source images over the same client.

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::models::{CreatedMedia, CreatedPost, NewPost, SearchHit};
use crate::utils::truncate_for_log;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Longest response body kept in error values and logs.
const MAX_BODY_LOG: usize = 500;

/// An image downloaded from the source site, ready for upload.
#[derive(Debug)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// `Content-Type` the source served the image with, if any.
    pub content_type: Option<String>,
}

pub struct WpClient {
    http: Client,
    posts_url: String,
    media_url: String,
    token: String,
}

impl fmt::Debug for WpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WpClient")
            .field("posts_url", &self.posts_url)
            .field("media_url", &self.media_url)
            .finish_non_exhaustive()
    }
}

impl WpClient {
    /// Build a client for the endpoints in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            posts_url: config.posts_endpoint(),
            media_url: config.media_endpoint(),
            token: config.token.clone(),
        })
    }

    /// The underlying HTTP client, shared with the page scraper.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Search existing posts by free text.
    #[instrument(level = "debug", skip_all)]
    pub async fn search_posts(&self, title: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .get(&self.posts_url)
            .bearer_auth(&self.token)
            .query(&[("search", title)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RelayError::DuplicateCheck {
                status: status.as_u16(),
            });
        }
        let hits: Vec<SearchHit> = response.json().await?;
        debug!(hits = hits.len(), "Search returned");
        Ok(hits)
    }

    /// Download an image from the source site.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch_image(&self, url: &str) -> Result<FetchedImage> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(RelayError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), ?content_type, "Downloaded image");
        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }

    /// Upload raw image bytes to the media library and return the media id.
    #[instrument(level = "info", skip_all, fields(%filename, %content_type))]
    pub async fn upload_media(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<u64> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.media_url)
            .bearer_auth(&self.token)
            .header(CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = body_for_log(response).await;
            return Err(RelayError::ImageUpload {
                status: status.as_u16(),
                body,
            });
        }

        let media: CreatedMedia = response.json().await?;
        info!(
            media_id = media.id,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Uploaded media"
        );
        Ok(media.id)
    }

    /// Create a post and return what WordPress assigned to it.
    ///
    /// A 201 means the post exists. If the body that came with it can't be
    /// decoded (plugins and PHP notices often prepend HTML), the post still
    /// counts as created and `Ok(None)` is returned.
    #[instrument(level = "info", skip_all, fields(title = %post.title))]
    pub async fn create_post(&self, post: &NewPost<'_>) -> Result<Option<CreatedPost>> {
        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.posts_url)
            .bearer_auth(&self.token)
            .json(post)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = body_for_log(response).await;
            return Err(RelayError::Publish {
                status: status.as_u16(),
                body,
            });
        }

        let elapsed_ms = t0.elapsed().as_millis() as u64;
        match response.json::<CreatedPost>().await {
            Ok(created) => {
                info!(post_id = created.id, elapsed_ms, "Created post");
                Ok(Some(created))
            }
            Err(e) => {
                warn!(
                    elapsed_ms,
                    error = %e,
                    "Post created but the response body could not be decoded"
                );
                Ok(None)
            }
        }
    }
}

async fn body_for_log(response: Response) -> String {
    match response.text().await {
        Ok(text) => truncate_for_log(&text, MAX_BODY_LOG),
        Err(e) => format!("<unreadable body: {e}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostCandidate;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> WpClient {
        let config = Config {
            source_url: "https://source.example".to_string(),
            api_base: format!("{}/wp-json/wp/v2", server.url()),
            token: "t0ken".to_string(),
            ..Config::default()
        };
        WpClient::new(&config).unwrap()
    }

    fn candidate() -> PostCandidate {
        PostCandidate {
            title: "Hello & welcome".to_string(),
            link: "https://source.example/hello/".to_string(),
            description: "Excerpt".to_string(),
            image_url: None,
            categories: vec![],
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_search_posts_encodes_title() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/wp-json/wp/v2/posts")
            .match_query(Matcher::UrlEncoded(
                "search".into(),
                "Hello & welcome".into(),
            ))
            .match_header("authorization", "Bearer t0ken")
            .with_status(200)
            .with_body(r#"[{"id": 3, "title": {"rendered": "Hello &amp; welcome"}}]"#)
            .create_async()
            .await;

        let hits = client_for(&server)
            .search_posts("Hello & welcome")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title.rendered, "Hello &amp; welcome");
    }

    #[tokio::test]
    async fn test_search_posts_failure_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/wp-json/wp/v2/posts")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).search_posts("x").await.unwrap_err();
        assert!(matches!(err, RelayError::DuplicateCheck { status: 401 }));
    }

    #[tokio::test]
    async fn test_upload_media_sends_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/wp-json/wp/v2/media")
            .match_header("authorization", "Bearer t0ken")
            .match_header("content-disposition", "attachment; filename=\"cat.png\"")
            .match_header("content-type", "image/png")
            .with_status(201)
            .with_body(r#"{"id": 42}"#)
            .create_async()
            .await;

        let id = client_for(&server)
            .upload_media(vec![1, 2, 3], "cat.png", "image/png")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(id, 42);
    }

    #[tokio::test]
    async fn test_create_post_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/wp-json/wp/v2/posts")
            .match_header("authorization", "Bearer t0ken")
            .match_body(Matcher::Json(json!({
                "title": "Hello & welcome",
                "content": "Excerpt",
                "status": "publish"
            })))
            .with_status(201)
            .with_body(r#"{"id": 7, "link": "https://blog.example/?p=7"}"#)
            .create_async()
            .await;

        let c = candidate();
        let created = client_for(&server)
            .create_post(&NewPost::publish(&c, None, false))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.map(|c| c.id), Some(7));
    }

    #[tokio::test]
    async fn test_create_post_created_with_unreadable_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/wp-json/wp/v2/posts")
            .with_status(201)
            .with_body("<br/><b>Notice</b>: Undefined index in functions.php<br/>{\"id\":5}")
            .expect(1)
            .create_async()
            .await;

        let c = candidate();
        let created = client_for(&server)
            .create_post(&NewPost::publish(&c, None, false))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_create_post_failure_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/wp-json/wp/v2/posts")
            .with_status(403)
            .with_body(r#"{"code":"rest_cannot_create"}"#)
            .create_async()
            .await;

        let c = candidate();
        let err = client_for(&server)
            .create_post(&NewPost::publish(&c, None, false))
            .await
            .unwrap_err();
        match err {
            RelayError::Publish { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("rest_cannot_create"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
