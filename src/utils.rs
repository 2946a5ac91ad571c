//! Small string helpers shared by the scraper and the publisher.
//!
//! - Log truncation for response bodies
//! - Whitespace normalisation for text pulled out of markup
//! - Filename and content-type inference for image uploads

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a character
/// boundary) with an ellipsis and a count of the dropped bytes appended.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Filename for a media upload, taken from the last path segment of the URL.
///
/// Percent-escapes are decoded and anything that cannot sit inside a quoted
/// header parameter is replaced with `_`. Falls back to `image.jpg` when the
/// URL has no usable segment.
pub fn filename_from_url(image_url: &str) -> String {
    let segment = Url::parse(image_url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|s| s.last().map(str::to_string)))
        .filter(|s| !s.is_empty());

    match segment {
        Some(raw) => urlencoding::decode(&raw)
            .map(|d| d.into_owned())
            .unwrap_or(raw)
            .chars()
            .map(|c| match c {
                '"' | '\\' | '/' => '_',
                c if c.is_ascii_graphic() || c == ' ' => c,
                _ => '_',
            })
            .collect(),
        None => "image.jpg".to_string(),
    }
}

/// Content type for an image upload.
///
/// Prefers the `Content-Type` the image was served with when it is an
/// `image/*` type, then the filename extension, then `image/jpeg`.
pub fn image_content_type(served: Option<&str>, filename: &str) -> String {
    if let Some(ct) = served {
        let mime = ct.split(';').next().unwrap_or("").trim();
        if mime.starts_with("image/") {
            return mime.to_string();
        }
    }

    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
    .to_string()
}
