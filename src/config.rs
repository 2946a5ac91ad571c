//! Runtime configuration.
//!
//! A [`Config`] is built once in `main` from an optional YAML file overlaid
//! with command-line values, validated, and then handed by reference to every
//! component that needs it.
//!
//! ```yaml
//! source_url: https://readforlearn.com
//! api_base: https://blog.example/wp-json/wp/v2
//! token: eyJ0eXAiOiJKV1Qi...
//! ledger_path: processed_posts.txt
//! max_pages: 50
//! concurrency: 4
//! dedupe: ledger
//! send_taxonomy: false
//! ```

use crate::cli::Cli;
use crate::error::{RelayError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use url::Url;

const DEFAULT_LEDGER_PATH: &str = "processed_posts.txt";
const DEFAULT_MAX_PAGES: u32 = 50;
const DEFAULT_CONCURRENCY: usize = 4;

/// Strategy used to decide whether a candidate was already published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupeStrategy {
    /// Look the candidate's link up in the local ledger.
    #[default]
    Ledger,
    /// Search the remote posts endpoint for an exact title match.
    RemoteSearch,
}

/// Fully merged and validated configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub api_base: String,
    /// Falls back to `api_base` when unset.
    #[serde(default)]
    pub media_api_base: Option<String>,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// `0` disables the page cap.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub dedupe: DedupeStrategy,
    #[serde(default)]
    pub send_taxonomy: bool,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from(DEFAULT_LEDGER_PATH)
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            api_base: String::new(),
            media_api_base: None,
            token: String::new(),
            ledger_path: default_ledger_path(),
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            dedupe: DedupeStrategy::default(),
            send_taxonomy: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source_url", &self.source_url)
            .field("api_base", &self.api_base)
            .field("media_api_base", &self.media_api_base)
            .field("token", &"<redacted>")
            .field("ledger_path", &self.ledger_path)
            .field("max_pages", &self.max_pages)
            .field("concurrency", &self.concurrency)
            .field("dedupe", &self.dedupe)
            .field("send_taxonomy", &self.send_taxonomy)
            .finish()
    }
}

impl Config {
    /// Load a config file from disk.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!("Loaded configuration file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Build the effective configuration: file first, then CLI overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        debug!(?config, "Resolved configuration");
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.source_url {
            self.source_url = v.clone();
        }
        if let Some(v) = &cli.api_base {
            self.api_base = v.clone();
        }
        if let Some(v) = &cli.media_api_base {
            self.media_api_base = Some(v.clone());
        }
        if let Some(v) = &cli.token {
            self.token = v.clone();
        }
        if let Some(v) = &cli.ledger {
            self.ledger_path = v.clone();
        }
        if let Some(v) = cli.max_pages {
            self.max_pages = v;
        }
        if let Some(v) = cli.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = cli.dedupe {
            self.dedupe = v;
        }
        if cli.send_taxonomy {
            self.send_taxonomy = true;
        }
    }

    /// Check that everything a run needs is present and well formed.
    pub fn validate(&self) -> Result<()> {
        require_url("source_url", &self.source_url)?;
        require_url("api_base", &self.api_base)?;
        if let Some(media) = &self.media_api_base {
            require_url("media_api_base", media)?;
        }
        if self.token.trim().is_empty() {
            return Err(RelayError::config("token is required"));
        }
        if self.concurrency == 0 {
            return Err(RelayError::config("concurrency must be at least 1"));
        }
        Ok(())
    }

    /// Page cap for the pagination driver, `None` when uncapped.
    pub fn page_cap(&self) -> Option<u32> {
        (self.max_pages > 0).then_some(self.max_pages)
    }

    pub fn posts_endpoint(&self) -> String {
        format!("{}/posts", self.api_base.trim_end_matches('/'))
    }

    pub fn media_endpoint(&self) -> String {
        let base = self.media_api_base.as_deref().unwrap_or(&self.api_base);
        format!("{}/media", base.trim_end_matches('/'))
    }
}

fn require_url(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::config(format!("{name} is required")));
    }
    Url::parse(value).map_err(|e| RelayError::config(format!("{name} is not a valid URL: {e}")))?;
    Ok(())
}
