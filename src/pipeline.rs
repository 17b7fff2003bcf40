//! Run orchestration: ledger, scrape, filter, deliver, record.
//!
//! 1. **Load** the seen-articles ledger
//! 2. **Scrape** every configured source, one after the other
//! 3. **Filter** out articles already in the ledger, capped per source
//! 4. **Deliver** each source's batch (or one combined batch)
//! 5. **Record** delivered URLs and save the ledger after every successful batch
//!
//! A batch that fails to deliver is not recorded, so its articles are
//! offered again on the next run.

use crate::config::{COMBINED_SOURCE_LABEL, Config, ConfigError};
use crate::delivery::{DeliveryClient, DeliveryError};
use crate::fetcher::Fetcher;
use crate::ledger::{LedgerStore, SeenLedger};
use crate::models::{ArticleRecord, Source};
use crate::scrapers::SourceScraper;
use std::error::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Why a run ended with a non-zero exit code.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The configuration cannot produce a useful run.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// An HTTP client could not be constructed.
    #[error("setup failed: {0}")]
    Setup(#[source] Box<dyn Error>),
    /// No source produced a single article.
    #[error("no articles found on any listing page")]
    NoArticles,
    /// At least one ready batch was not accepted by the webhook.
    #[error("delivery failed for {}", .0.join(", "))]
    DeliveryFailed(Vec<String>),
}

/// Counts for the end-of-run log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub scraped: usize,
    pub new: usize,
    pub delivered: usize,
}

/// Articles of one source that are not in the ledger yet.
#[derive(Debug)]
struct SourceBatch {
    source: Source,
    articles: Vec<ArticleRecord>,
}

/// Execute one complete run.
#[instrument(level = "info", skip_all, fields(combined = config.combined))]
pub async fn run(config: &Config) -> Result<RunSummary, RunError> {
    config.validate()?;

    let store = LedgerStore::new(&config.seen_file);
    let mut ledger = store.load();

    let fetcher = Fetcher::new().map_err(RunError::Setup)?;
    let delivery =
        DeliveryClient::new(&config.webhook_url, config.delivery_timeout).map_err(RunError::Setup)?;
    let scraper = SourceScraper::new(&fetcher, config);

    let mut summary = RunSummary::default();
    let mut batches = Vec::with_capacity(config.sites.len());
    for (i, site) in config.sites.iter().enumerate() {
        if i > 0 && !config.source_delay.is_zero() {
            sleep(config.source_delay).await;
        }
        let articles = scraper.scrape(site).await;
        summary.scraped += articles.len();
        let batch = filter_new(site.source, articles, &ledger, config.max_articles);
        summary.new += batch.articles.len();
        batches.push(batch);
    }

    if summary.scraped == 0 {
        error!(
            "No articles found; the sites may be offline, their markup may have changed, or the selectors need updating"
        );
        return Err(RunError::NoArticles);
    }

    let mut failed = Vec::new();
    if config.combined {
        let articles: Vec<ArticleRecord> = batches.into_iter().flat_map(|b| b.articles).collect();
        match deliver_and_record(&delivery, &store, &mut ledger, &articles, COMBINED_SOURCE_LABEL).await {
            Ok(count) => summary.delivered += count,
            Err(_) => failed.push(COMBINED_SOURCE_LABEL.to_string()),
        }
    } else {
        for batch in batches {
            let label = batch.source.key();
            match deliver_and_record(&delivery, &store, &mut ledger, &batch.articles, label).await {
                Ok(count) => summary.delivered += count,
                Err(_) => failed.push(label.to_string()),
            }
        }
    }

    if !failed.is_empty() {
        return Err(RunError::DeliveryFailed(failed));
    }

    if summary.new == 0 {
        info!("No new articles to deliver");
    }
    Ok(summary)
}

/// Drop already-delivered articles and cap the rest at `limit`.
fn filter_new(source: Source, articles: Vec<ArticleRecord>, ledger: &SeenLedger, limit: usize) -> SourceBatch {
    let found = articles.len();
    let mut fresh: Vec<ArticleRecord> = articles
        .into_iter()
        .filter(|article| ledger.is_new(source, &article.url))
        .collect();
    let new = fresh.len();

    info!(
        %source,
        found,
        new,
        already_seen = found - new,
        "Filtered against ledger"
    );
    if new > limit {
        warn!(%source, limit, new, "Capping batch; the remainder is sent next run");
        fresh.truncate(limit);
    }

    SourceBatch {
        source,
        articles: fresh,
    }
}

/// Deliver one batch and, on success, record and persist its URLs.
///
/// Returns the number of delivered articles.
async fn deliver_and_record(
    delivery: &DeliveryClient,
    store: &LedgerStore,
    ledger: &mut SeenLedger,
    articles: &[ArticleRecord],
    label: &str,
) -> Result<usize, DeliveryError> {
    if articles.is_empty() {
        return Ok(0);
    }

    if let Err(e) = delivery.deliver(articles, label).await {
        error!(source = %label, error = %e, "Articles NOT delivered; they stay eligible for the next run");
        return Err(e);
    }

    for article in articles {
        ledger.record(article.source, &article.url);
    }
    if let Err(e) = store.save(ledger) {
        error!(path = %store.path().display(), error = %e, "Failed to save seen articles");
    }
    Ok(articles.len())
}
