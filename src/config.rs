//! Run configuration, built once from the command line before any component runs.
//!
//! Components receive a `&Config`; nothing reads the environment after
//! start-up.

use crate::cli::Cli;
use crate::models::Source;
use crate::scrapers::{self, SiteConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Webhook used when `WEBHOOK_URL` is not set.
pub const DEFAULT_WEBHOOK_URL: &str = "https://hook.eu1.make.com/wbq45srdf6qr7r7bqi7x4v7381s6j0to";

/// Value left in templates that was never replaced with a real hook.
pub const WEBHOOK_PLACEHOLDER: &str = "HIER_JOUW_MAKE_WEBHOOK_URL";

/// User-Agent sent with every outbound request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Payload label used when all sources are delivered in a single batch.
pub const COMBINED_SOURCE_LABEL: &str = "all_sources";

/// A configuration that cannot produce a useful run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("WEBHOOK_URL is not set")]
    MissingWebhook,
    #[error("WEBHOOK_URL must start with http:// or https:// (got `{0}`)")]
    WebhookScheme(String),
    #[error("max articles per run must be at least 1")]
    ZeroLimit,
    #[error("no sources selected")]
    NoSources,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Webhook that receives each batch.
    pub webhook_url: String,
    /// Path of the seen-articles ledger.
    pub seen_file: PathBuf,
    /// Maximum number of articles scraped and delivered per source.
    pub max_articles: usize,
    /// Send one batch across all sources instead of one per source.
    pub combined: bool,
    /// Sites to scrape, in order.
    pub sites: Vec<SiteConfig>,
    pub listing_timeout: Duration,
    pub detail_timeout: Duration,
    pub delivery_timeout: Duration,
    /// Pause between successive detail-page fetches.
    pub detail_delay: Duration,
    /// Pause between sources.
    pub source_delay: Duration,
}

impl Config {
    /// Build the configuration from parsed CLI arguments.
    ///
    /// An empty `--source` list selects every supported source.
    pub fn from_cli(cli: &Cli) -> Self {
        let sources: Vec<Source> = if cli.sources.is_empty() {
            Source::ALL.to_vec()
        } else {
            let mut picked = Vec::new();
            for source in &cli.sources {
                if !picked.contains(source) {
                    picked.push(*source);
                }
            }
            picked
        };

        Self {
            webhook_url: cli.webhook_url.trim().to_string(),
            seen_file: cli.seen_file.clone(),
            max_articles: cli.max_articles,
            combined: cli.combined,
            sites: sources.into_iter().map(scrapers::site_for).collect(),
            detail_delay: Duration::from_millis(cli.detail_delay_ms),
            source_delay: Duration::from_millis(cli.source_delay_ms),
            ..Self::default()
        }
    }

    /// Check the values that would make a run pointless.
    ///
    /// Reachability of the webhook is not checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook_url.is_empty() || self.webhook_url == WEBHOOK_PLACEHOLDER {
            return Err(ConfigError::MissingWebhook);
        }
        if !self.webhook_url.starts_with("http://") && !self.webhook_url.starts_with("https://") {
            return Err(ConfigError::WebhookScheme(self.webhook_url.clone()));
        }
        if self.max_articles == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.sites.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            seen_file: PathBuf::from("seen_articles.json"),
            max_articles: 5,
            combined: false,
            sites: Source::ALL.into_iter().map(scrapers::site_for).collect(),
            listing_timeout: Duration::from_secs(10),
            detail_timeout: Duration::from_secs(10),
            delivery_timeout: Duration::from_secs(10),
            detail_delay: Duration::from_secs(1),
            source_delay: Duration::from_secs(2),
        }
    }
}
