//! Data models for scraped articles and the webhook payload.
//!
//! - [`Source`]: The news site an article was scraped from
//! - [`ArticleRecord`]: One normalized article, as forwarded downstream
//! - [`WebhookPayload`]: The JSON body of a single delivery batch

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A supported news site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// streamwijzer.nl
    Streamwijzer,
    /// netflixvandaag.nl
    NetflixVandaag,
}

impl Source {
    /// All sources, in the order they are scraped.
    pub const ALL: [Source; 2] = [Source::Streamwijzer, Source::NetflixVandaag];

    /// The stable key used in the seen-articles ledger and in payload labels.
    pub fn key(&self) -> &'static str {
        match self {
            Source::Streamwijzer => "streamwijzer",
            Source::NetflixVandaag => "netflixvandaag",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source `{s}` (expected streamwijzer or netflixvandaag)"))
    }
}

/// A scraped news article.
///
/// `url` is always absolute and identifies the article within its source.
/// `image_url` is absolute or empty. `scheduled_time` is only filled in by
/// the delivery client and is omitted from the JSON when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub source: Source,
    pub title: String,
    pub url: String,
    pub image_url: String,
    pub excerpt: String,
    pub date: String,
    /// ISO 8601 local timestamp of extraction.
    pub scraped_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
}

/// JSON body posted to the webhook.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub articles: Vec<ArticleRecord>,
    pub total: usize,
    pub source: &'a str,
    pub scraped_at: String,
}
