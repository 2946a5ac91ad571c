//! Command-line interface definitions for wp_repost.
//!
//! Every option is optional here; values given on the command line (or via
//! the matching environment variable) override whatever the YAML config file
//! says. Validation of the merged result happens in [`crate::config`].

use crate::config::DedupeStrategy;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for wp_repost.
///
/// # Examples
///
/// ```sh
/// # Everything from flags
/// wp_repost -s https://readforlearn.com \
///   --api-base https://blog.example/wp-json/wp/v2 --token "$WP_TOKEN"
///
/// # Config file plus an override
/// wp_repost -c wp_repost.yaml --max-pages 3 --concurrency 1
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the source site whose listing pages are scraped
    #[arg(short, long, env = "SOURCE_URL")]
    pub source_url: Option<String>,

    /// WordPress REST base, e.g. https://blog.example/wp-json/wp/v2
    #[arg(long, env = "WP_API_BASE")]
    pub api_base: Option<String>,

    /// REST base for media uploads (defaults to the API base)
    #[arg(long, env = "WP_MEDIA_API_BASE")]
    pub media_api_base: Option<String>,

    /// Bearer token for the WordPress API
    #[arg(long, env = "WP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Newline-delimited file of links that were already published
    #[arg(short, long, env = "LEDGER_PATH")]
    pub ledger: Option<PathBuf>,

    /// Maximum number of listing pages to scrape (0 for no cap)
    #[arg(short = 'p', long)]
    pub max_pages: Option<u32>,

    /// Number of posts published concurrently (1 publishes sequentially)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// How already-published posts are detected
    #[arg(long, value_enum)]
    pub dedupe: Option<DedupeStrategy>,

    /// Send extracted categories and tags with each post
    #[arg(long)]
    pub send_taxonomy: bool,
}
