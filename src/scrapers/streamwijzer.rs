//! Streamwijzer news scraper.
//!
//! Scrapes [streamwijzer.nl/nieuws](https://www.streamwijzer.nl/nieuws/), a
//! WordPress (Newspaper theme) site. Teasers carry a usable `srcset`, so the
//! listing image is kept and the detail page is only consulted for an image
//! when the teaser has none. Some teaser slots are ads without a link, hence
//! the margin iteration.

use super::{Iteration, SiteConfig};
use crate::models::Source;
use url::Url;

pub const LISTING_URL: &str = "https://www.streamwijzer.nl/nieuws/";
pub const ORIGIN: &str = "https://www.streamwijzer.nl";

/// Site configuration for Streamwijzer.
pub fn site() -> SiteConfig {
    SiteConfig {
        source: Source::Streamwijzer,
        listing_url: LISTING_URL.to_string(),
        origin: Url::parse(ORIGIN).expect("valid origin"),
        container_selectors: &["article", "div[class*='post']", "div[class*='article']"],
        content_selectors: &[
            "div.td-post-content",
            "div.entry-content",
            "article.post",
            "div.post-content",
        ],
        featured_image_selector: "div.td-post-featured-image",
        iteration: Iteration::Margin,
        prefer_detail_image: false,
    }
}
