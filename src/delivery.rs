//! Webhook delivery of new-article batches.
//!
//! Each batch is a single POST of a [`WebhookPayload`]. Before sending, every
//! article gets a `scheduled_time` from a fixed rotation so the downstream
//! automation can spread posts over the evening and the next day.
//!
//! # Rotation
//!
//! | Slot | Time |
//! |------|------|
//! | 0-1 | today 19:00, 21:00 |
//! | 2-9 | tomorrow 08:00 to 22:00, every two hours |
//!
//! Articles beyond the last slot all share the last slot.

use crate::config::USER_AGENT;
use crate::models::{ArticleRecord, WebhookPayload};
use crate::utils::{now_iso, truncate_for_log};
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, instrument};

/// `(day offset, hour)` of every rotation slot.
const ROTATION_SLOTS: [(u64, u32); 10] = [
    (0, 19),
    (0, 21),
    (1, 8),
    (1, 10),
    (1, 12),
    (1, 14),
    (1, 16),
    (1, 18),
    (1, 20),
    (1, 22),
];

/// Format of `scheduled_time` values.
pub const SCHEDULE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Why a batch was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The webhook answered 410 Gone: it has expired and must be replaced.
    #[error("webhook has expired (HTTP 410)")]
    Expired,
    /// Any other 4xx/5xx answer.
    #[error("webhook answered HTTP {0}")]
    Status(StatusCode),
    /// The request never got a response.
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Scheduling rotation for batches prepared on `today`.
pub fn schedule_rotation(today: NaiveDate) -> Vec<NaiveDateTime> {
    ROTATION_SLOTS
        .iter()
        .filter_map(|&(days, hour)| {
            let date = today.checked_add_days(Days::new(days))?;
            let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
            Some(date.and_time(time))
        })
        .collect()
}

/// Copy `articles`, giving the i-th one rotation slot i (clamped to the last slot).
pub fn assign_schedule(articles: &[ArticleRecord], rotation: &[NaiveDateTime]) -> Vec<ArticleRecord> {
    articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let slot = rotation.get(i).or(rotation.last());
            ArticleRecord {
                scheduled_time: slot.map(|t| t.format(SCHEDULE_FORMAT).to_string()),
                ..article.clone()
            }
        })
        .collect()
}

/// Posts batches to the configured webhook.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl DeliveryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Deliver `articles` as one batch labelled `source`.
    ///
    /// An empty batch is not sent and counts as delivered.
    #[instrument(level = "info", skip(self, articles), fields(count = articles.len()))]
    pub async fn deliver(&self, articles: &[ArticleRecord], source: &str) -> Result<(), DeliveryError> {
        if articles.is_empty() {
            info!("No articles to deliver");
            return Ok(());
        }

        let rotation = schedule_rotation(Local::now().date_naive());
        let payload = WebhookPayload {
            articles: assign_schedule(articles, &rotation),
            total: articles.len(),
            source,
            scraped_at: now_iso(),
        };

        info!("Sending batch to webhook");
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Webhook request failed"))?;

        let status = response.status();
        if status == StatusCode::GONE {
            error!(
                %status,
                "Webhook has expired; create a new webhook and update WEBHOOK_URL"
            );
            return Err(DeliveryError::Expired);
        }
        if status.is_client_error() || status.is_server_error() {
            error!(%status, "Webhook rejected the batch");
            return Err(DeliveryError::Status(status));
        }

        info!(%status, delivered = articles.len(), "Batch delivered");
        for (i, article) in payload.articles.iter().enumerate() {
            info!(
                n = i + 1,
                title = %truncate_for_log(&article.title, 70),
                scheduled_time = article.scheduled_time.as_deref().unwrap_or_default(),
                "Delivered article"
            );
        }
        Ok(())
    }
}
