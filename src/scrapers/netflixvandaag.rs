//! Netflix Vandaag news scraper.
//!
//! Scrapes [netflixvandaag.nl/nieuws](https://www.netflixvandaag.nl/nieuws/).
//! Listing thumbnails are small crops, so the detail page's `og:image` is
//! preferred. Every teaser on the listing is a real article, so exactly
//! `limit` containers are examined.

use super::{Iteration, SiteConfig};
use crate::models::Source;
use url::Url;

pub const LISTING_URL: &str = "https://www.netflixvandaag.nl/nieuws/";
pub const ORIGIN: &str = "https://www.netflixvandaag.nl";

/// Site configuration for Netflix Vandaag.
pub fn site() -> SiteConfig {
    SiteConfig {
        source: Source::NetflixVandaag,
        listing_url: LISTING_URL.to_string(),
        origin: Url::parse(ORIGIN).expect("valid origin"),
        container_selectors: &["article", "div[class*='post']", "div[class*='article']"],
        content_selectors: &[
            "div.entry-content",
            "div.article-content",
            "div.post-content",
            "article",
        ],
        featured_image_selector: "figure.post-thumbnail",
        iteration: Iteration::Strict,
        prefer_detail_image: true,
    }
}
