//! # Stream News Relay
//!
//! A scheduled batch job that scrapes the news listings of Dutch streaming
//! sites, skips articles it has delivered before, and forwards the rest to a
//! webhook (for example a Make.com scenario that schedules social posts).
//!
//! ## Usage
//!
//! ```sh
//! WEBHOOK_URL=https://hook.eu1.make.com/... stream_news_relay
//! ```
//!
//! ## Architecture
//!
//! The application is a strictly sequential pipeline:
//! 1. **Ledger**: Load the URLs delivered in earlier runs
//! 2. **Scraping**: Walk each listing page, fetching every article's detail page
//! 3. **Filtering**: Keep only articles missing from the ledger
//! 4. **Delivery**: POST each batch to the webhook and record what was accepted
//!
//! ## Exit codes
//!
//! `0` for every completed run, including runs with nothing new. `1` when the
//! configuration is unusable, no article was found at all, a batch was
//! rejected, or the run was interrupted.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod delivery;
mod extract;
mod fetcher;
mod ledger;
mod models;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("stream_news_relay starting up");

    let args = Cli::parse();
    let config = Config::from_cli(&args);
    debug!(
        seen_file = %config.seen_file.display(),
        max_articles = config.max_articles,
        sources = config.sites.len(),
        combined = config.combined,
        "Parsed CLI arguments"
    );

    let outcome = tokio::select! {
        result = pipeline::run(&config) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; stopping without further ledger updates");
            return ExitCode::FAILURE;
        }
    };

    let elapsed = start_time.elapsed();
    match outcome {
        Ok(summary) => {
            info!(
                scraped = summary.scraped,
                new = summary.new,
                delivered = summary.delivered,
                secs = elapsed.as_secs(),
                millis = elapsed.subsec_millis(),
                "Run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(
                error = %e,
                secs = elapsed.as_secs(),
                millis = elapsed.subsec_millis(),
                "Run failed"
            );
            ExitCode::FAILURE
        }
    }
}
