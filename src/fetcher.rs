//! Plain HTTP GET for listing and detail pages.
//!
//! One request per call: no retries, no backoff. Any transport error or
//! non-2xx status is returned as an error for the caller to degrade.

use crate::config::USER_AGENT;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher that sends the fixed [`USER_AGENT`].
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return the response body as text.
    #[instrument(level = "debug", skip(self), fields(%url))]
    pub async fn get_html(&self, url: &str, timeout: Duration) -> Result<String, Box<dyn Error>> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
