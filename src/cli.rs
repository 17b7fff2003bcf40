//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment, which is how
//! scheduled cloud runs configure the webhook.

use crate::config::DEFAULT_WEBHOOK_URL;
use crate::models::Source;
use clap::Parser;
use std::path::PathBuf;

/// Forward new streaming-news articles to a webhook.
///
/// # Examples
///
/// ```sh
/// # Scrape both sources and deliver one batch per source
/// WEBHOOK_URL=https://hook.eu1.make.com/... stream_news_relay
///
/// # Only Streamwijzer, at most 3 articles, one combined batch
/// stream_news_relay --source streamwijzer --max-articles 3 --combined
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Webhook that receives the article batches
    #[arg(long, env = "WEBHOOK_URL", default_value = DEFAULT_WEBHOOK_URL)]
    pub webhook_url: String,

    /// JSON file recording already delivered articles
    #[arg(short, long, env = "SEEN_ARTICLES_FILE", default_value = "seen_articles.json")]
    pub seen_file: PathBuf,

    /// Maximum number of articles per source per run
    #[arg(short, long, env = "MAX_ARTICLES_PER_RUN", default_value_t = 5)]
    pub max_articles: usize,

    /// Source to scrape (repeatable); defaults to all sources
    #[arg(long = "source", value_name = "SOURCE")]
    pub sources: Vec<Source>,

    /// Deliver all sources in a single batch
    #[arg(long)]
    pub combined: bool,

    /// Pause between detail-page fetches, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub detail_delay_ms: u64,

    /// Pause between sources, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub source_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_explicit_flags() {
        let cli = Cli::parse_from([
            "stream_news_relay",
            "--webhook-url",
            "https://hooks.example.com/x",
            "--seen-file",
            "/tmp/seen.json",
            "--max-articles",
            "3",
            "--source",
            "streamwijzer",
            "--combined",
        ]);

        assert_eq!(cli.webhook_url, "https://hooks.example.com/x");
        assert_eq!(cli.seen_file, PathBuf::from("/tmp/seen.json"));
        assert_eq!(cli.max_articles, 3);
        assert_eq!(cli.sources, vec![Source::Streamwijzer]);
        assert!(cli.combined);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["stream_news_relay", "-s", "state.json", "-m", "7"]);
        assert_eq!(cli.seen_file, PathBuf::from("state.json"));
        assert_eq!(cli.max_articles, 7);
        assert!(!cli.combined);
    }

    #[test]
    fn test_cli_rejects_unknown_source() {
        let result = Cli::try_parse_from(["stream_news_relay", "--source", "nos"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_delay_defaults() {
        let cli = Cli::parse_from(["stream_news_relay"]);
        assert_eq!(cli.detail_delay_ms, 1000);
        assert_eq!(cli.source_delay_ms, 2000);
        assert!(cli.sources.is_empty());
    }
}
