//! Append-only record of links that were already published.
//!
//! On disk the ledger is a plain text file with one link per line. It is
//! created empty if missing and is only ever appended to.
//!
//! In memory the set of known links and the append handle sit behind a single
//! [`tokio::sync::Mutex`], so concurrent publishers serialize their writes and
//! a link is written at most once no matter how many tasks try to record it.

use crate::error::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

#[derive(Debug)]
struct LedgerState {
    links: HashSet<String>,
    file: File,
}

impl Ledger {
    /// Open (or create) the ledger at `path` and load every recorded link.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let raw = fs::read_to_string(&path).await?;
        // An unterminated last line would swallow the next appended link.
        if !raw.is_empty() && !raw.ends_with('\n') {
            file.write_all(b"\n").await?;
            file.flush().await?;
            debug!("Terminated unfinished last line");
        }
        let links: HashSet<String> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        info!(entries = links.len(), "Loaded ledger");
        Ok(Self {
            path,
            state: Mutex::new(LedgerState { links, file }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn contains(&self, link: &str) -> bool {
        self.state.lock().await.links.contains(link.trim())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.links.len()
    }

    /// Record `link` as published.
    ///
    /// The link is appended as its own line and flushed before the in-memory
    /// set is updated.
    ///
    /// # Arguments
    ///
    /// * `link` - Source URL of the published candidate (surrounding
    ///   whitespace is ignored)
    ///
    /// # Returns
    ///
    /// `Ok(true)` when the link was appended, `Ok(false)` without touching the
    /// file when it was already recorded, or the I/O error from the append.
    pub async fn record(&self, link: &str) -> Result<bool> {
        let link = link.trim();
        let mut state = self.state.lock().await;
        if state.links.contains(link) {
            debug!(%link, "Link already in ledger");
            return Ok(false);
        }

        state.file.write_all(format!("{link}\n").as_bytes()).await?;
        state.file.flush().await?;
        state.links.insert(link.to_string());
        debug!(%link, "Recorded link in ledger");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("processed_posts.txt");

        let ledger = Ledger::open(&path).await.unwrap();

        assert!(path.exists());
        assert_eq!(ledger.len().await, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_open_loads_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        std::fs::write(&path, "https://a.example/1/\r\n\nhttps://a.example/2/\n").unwrap();

        let ledger = Ledger::open(&path).await.unwrap();

        assert_eq!(ledger.len().await, 2);
        assert!(ledger.contains("https://a.example/1/").await);
        assert!(ledger.contains("https://a.example/2/").await);
        assert!(!ledger.contains("https://a.example/3/").await);
    }

    #[tokio::test]
    async fn test_record_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        std::fs::write(&path, "https://a.example/old/\n").unwrap();
        let ledger = Ledger::open(&path).await.unwrap();

        assert!(ledger.record("https://a.example/new/").await.unwrap());
        assert!(!ledger.record("https://a.example/new/").await.unwrap());
        assert!(!ledger.record("https://a.example/old/").await.unwrap());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "https://a.example/old/\nhttps://a.example/new/\n");
    }

    #[tokio::test]
    async fn test_record_after_unterminated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        std::fs::write(&path, "https://a.example/old/").unwrap();

        {
            let ledger = Ledger::open(&path).await.unwrap();
            assert!(ledger.contains("https://a.example/old/").await);
            assert!(ledger.record("https://a.example/new/").await.unwrap());
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "https://a.example/old/\nhttps://a.example/new/\n");

        let reopened = Ledger::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 2);
        assert!(reopened.contains("https://a.example/old/").await);
        assert!(reopened.contains("https://a.example/new/").await);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        {
            let ledger = Ledger::open(&path).await.unwrap();
            ledger.record("https://a.example/x/").await.unwrap();
        }
        let reopened = Ledger::open(&path).await.unwrap();
        assert!(reopened.contains("https://a.example/x/").await);
    }

    #[tokio::test]
    async fn test_concurrent_records_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        let ledger = Arc::new(Ledger::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..50 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                // every link is recorded twice from different tasks
                let link = format!("https://a.example/{}/", i % 25);
                ledger.record(&link).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 25);
        let unique: HashSet<&str> = lines.iter().copied().collect();
        assert_eq!(unique.len(), 25);
        assert!(lines.iter().all(|l| l.starts_with("https://a.example/")));
    }
}
