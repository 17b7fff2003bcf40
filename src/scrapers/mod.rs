//! Listing-page scrapers for the supported news sites.
//!
//! Scraping is a two-phase pattern:
//!
//! 1. **Indexing**: parse the listing page into [`ListingItem`]s (link, title,
//!    teaser image, date, teaser text), bounded and deduplicated
//! 2. **Assembling**: fetch each item's detail page and combine both into an
//!    [`ArticleRecord`]
//!
//! # Supported Sources
//!
//! | Source | Module | Iteration | Image preference |
//! |--------|--------|-----------|------------------|
//! | Streamwijzer | [`streamwijzer`] | margin (2 x limit containers) | listing teaser |
//! | Netflix Vandaag | [`netflixvandaag`] | strict (limit containers) | detail page |
//!
//! A site is described entirely by its [`SiteConfig`]; the scraping code is
//! shared.

pub mod netflixvandaag;
pub mod streamwijzer;

use crate::config::Config;
use crate::extract::{self, EXCERPT_PLACEHOLDER};
use crate::fetcher::Fetcher;
use crate::models::{ArticleRecord, Source};
use crate::utils::{now_iso, truncate_for_log};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("invalid link selector"));

/// Detail-page bodies shorter than this are replaced by the listing teaser.
pub const MIN_DETAIL_CHARS: usize = 50;

/// How many listing containers are examined per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// Examine up to twice the limit, leaving room for skipped containers.
    Margin,
    /// Examine exactly `limit` containers.
    Strict,
}

impl Iteration {
    pub fn container_budget(self, limit: usize) -> usize {
        match self {
            Iteration::Margin => limit.saturating_mul(2),
            Iteration::Strict => limit,
        }
    }
}

/// Markup knowledge about one news site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub source: Source,
    /// Listing page that enumerates recent articles.
    pub listing_url: String,
    /// Base for resolving relative links and images.
    pub origin: Url,
    /// Candidate article-container selectors; the first that matches anything wins.
    pub container_selectors: &'static [&'static str],
    /// Candidate content-wrapper selectors on the detail page, in order.
    pub content_selectors: &'static [&'static str],
    /// Wrapper holding the featured image on the detail page.
    pub featured_image_selector: &'static str,
    pub iteration: Iteration,
    /// Use the detail page's image even when the teaser has one.
    pub prefer_detail_image: bool,
}

/// Site configuration for `source`.
pub fn site_for(source: Source) -> SiteConfig {
    match source {
        Source::Streamwijzer => streamwijzer::site(),
        Source::NetflixVandaag => netflixvandaag::site(),
    }
}

/// One teaser on a listing page, before its detail page is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingItem {
    pub url: String,
    pub title: String,
    pub image_url: String,
    pub date: String,
    pub teaser: String,
}

/// Parse a listing page into at most `limit` distinct items.
///
/// Containers without a link or a title are skipped, as are links already
/// seen earlier on the same page.
pub fn index_listing(html: &str, site: &SiteConfig, limit: usize) -> Vec<ListingItem> {
    let document = Html::parse_document(html);
    let containers = find_containers(&document, site);
    let budget = site.iteration.container_budget(limit);
    debug!(
        source = %site.source,
        containers = containers.len(),
        budget,
        "Found listing containers"
    );

    let mut seen_urls = HashSet::new();
    let mut items = Vec::new();

    for container in containers.into_iter().take(budget) {
        if items.len() >= limit {
            break;
        }
        let Some(title) = extract::extract_title(container, site) else {
            debug!("Skipping container without title");
            continue;
        };
        let Some(href) = container
            .select(&LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
        else {
            debug!(%title, "Skipping container without link");
            continue;
        };
        let Some(url) = extract::absolutize(&site.origin, href) else {
            warn!(%href, "Skipping container with unusable link");
            continue;
        };
        if !seen_urls.insert(url.clone()) {
            debug!(%url, "Skipping duplicate link");
            continue;
        }

        items.push(ListingItem {
            image_url: extract::listing_image(container, site),
            date: extract::extract_date(container, site),
            teaser: extract::extract_teaser(container, site),
            url,
            title,
        });
    }

    items
}

fn find_containers<'a>(document: &'a Html, site: &SiteConfig) -> Vec<ElementRef<'a>> {
    for raw in site.container_selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(selector = %raw, error = %e, "Invalid container selector");
                continue;
            }
        };
        let found: Vec<ElementRef<'a>> = document.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Combine a listing item with its (optional) detail page into a record.
pub fn assemble(item: ListingItem, detail_html: Option<&str>, site: &SiteConfig) -> ArticleRecord {
    let detail = detail_html.map(Html::parse_document);

    let detail_image = || {
        detail
            .as_ref()
            .map(|doc| extract::detail_image(doc, site))
            .unwrap_or_default()
    };
    let image_url = if site.prefer_detail_image {
        Some(detail_image())
            .filter(|url| !url.is_empty())
            .unwrap_or(item.image_url)
    } else if item.image_url.is_empty() {
        detail_image()
    } else {
        item.image_url
    };

    let mut excerpt = detail
        .as_ref()
        .map(|doc| extract::extract_body(doc, site))
        .unwrap_or_default();
    if excerpt.chars().count() < MIN_DETAIL_CHARS && !item.teaser.is_empty() {
        excerpt = item.teaser;
    }
    if excerpt.is_empty() {
        excerpt = EXCERPT_PLACEHOLDER.to_string();
    }

    ArticleRecord {
        source: site.source,
        title: item.title,
        url: item.url,
        image_url,
        excerpt: extract::truncate_excerpt(excerpt),
        date: item.date,
        scraped_at: now_iso(),
        scheduled_time: None,
    }
}

/// Scrapes one site at a time, strictly sequentially.
#[derive(Debug)]
pub struct SourceScraper<'a> {
    fetcher: &'a Fetcher,
    config: &'a Config,
}

impl<'a> SourceScraper<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a Config) -> Self {
        Self { fetcher, config }
    }

    /// Scrape up to `max_articles` records from `site`.
    ///
    /// Never fails: an unreachable listing page yields an empty vector, and
    /// an unreachable detail page degrades that record's body and image.
    #[instrument(level = "info", skip_all, fields(source = %site.source))]
    pub async fn scrape(&self, site: &SiteConfig) -> Vec<ArticleRecord> {
        let limit = self.config.max_articles;
        info!(url = %site.listing_url, limit, "Scraping listing page");

        let html = match self
            .fetcher
            .get_html(&site.listing_url, self.config.listing_timeout)
            .await
        {
            Ok(html) => html,
            Err(e) => {
                error!(url = %site.listing_url, error = %e, "Listing fetch failed");
                return Vec::new();
            }
        };

        let items = index_listing(&html, site, limit);
        info!(count = items.len(), "Indexed listing items");

        let mut articles = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 && !self.config.detail_delay.is_zero() {
                sleep(self.config.detail_delay).await;
            }
            let detail = match self
                .fetcher
                .get_html(&item.url, self.config.detail_timeout)
                .await
            {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!(url = %item.url, error = %e, "Detail fetch failed; using listing data only");
                    None
                }
            };

            let record = assemble(item, detail.as_deref(), site);
            info!(
                title = %truncate_for_log(&record.title, 60),
                excerpt_chars = record.excerpt.chars().count(),
                has_image = !record.image_url.is_empty(),
                "Found article"
            );
            articles.push(record);
        }

        info!(count = articles.len(), "Scraping complete");
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{TITLE_PLACEHOLDER, TRUNCATION_MARKER};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_site(base: &Url, template: SiteConfig) -> SiteConfig {
        SiteConfig {
            listing_url: base.join("/nieuws/").unwrap().to_string(),
            origin: base.clone(),
            ..template
        }
    }

    fn test_config(limit: usize) -> Config {
        Config {
            max_articles: limit,
            detail_delay: Duration::ZERO,
            source_delay: Duration::ZERO,
            ..Config::default()
        }
    }

    fn listing<S: AsRef<str>>(containers: &[S]) -> String {
        let body: String = containers.iter().map(AsRef::as_ref).collect();
        format!("<html><body>{body}</body></html>")
    }

    fn teaser(slug: &str, title: &str) -> String {
        format!(
            r#"<article><h2><a href="/nieuws/{slug}/">{title}</a></h2>
               <img src="/img/{slug}.jpg"><time datetime="2026-10-18">18 okt</time>
               <p>Teaser voor {title}</p></article>"#
        )
    }

    fn detail(body: &str) -> String {
        format!(
            r#"<html><head><meta property="og:image" content="https://cdn.example.com/hi-res.jpg"></head>
               <body><div class="td-post-content"><p>{body}</p></div></body></html>"#
        )
    }

    #[test]
    fn test_iteration_budget() {
        assert_eq!(Iteration::Margin.container_budget(5), 10);
        assert_eq!(Iteration::Strict.container_budget(5), 5);
    }

    #[test]
    fn test_index_skips_containers_without_link_or_title() {
        let html = listing(&[
            "<article><p>Geen titel en geen link</p></article>".to_string(),
            r#"<article><h2>Alleen titel</h2></article>"#.to_string(),
            r#"<article><a href="/nieuws/alleen-link/">lees meer</a></article>"#.to_string(),
            teaser("geldig", "Geldig artikel"),
        ]);
        let items = index_listing(&html, &streamwijzer::site(), 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.streamwijzer.nl/nieuws/geldig/");
        assert_eq!(items[0].title, "Geldig artikel");
        assert_eq!(items[0].image_url, "https://www.streamwijzer.nl/img/geldig.jpg");
        assert_eq!(items[0].date, "2026-10-18");
        assert_eq!(items[0].teaser, "Teaser voor Geldig artikel");
    }

    #[test]
    fn test_index_dedups_links_within_page() {
        let html = listing(&[
            teaser("een", "Een"),
            teaser("een", "Een (herhaald)"),
            r#"<article><h3>Absoluut</h3><a href="https://www.streamwijzer.nl/nieuws/een/">x</a></article>"#
                .to_string(),
            teaser("twee", "Twee"),
        ]);
        let items = index_listing(&html, &streamwijzer::site(), 5);
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.streamwijzer.nl/nieuws/een/",
                "https://www.streamwijzer.nl/nieuws/twee/"
            ]
        );
    }

    #[test]
    fn test_index_margin_versus_strict_budget() {
        let mut containers = vec!["<article><p>leeg</p></article>".to_string(); 2];
        containers.extend((0..4).map(|i| teaser(&format!("a{i}"), &format!("Artikel {i}"))));
        let html = listing(&containers);

        // Margin: 4 containers examined for limit 2, the two empty ones are skipped.
        let margin = index_listing(&html, &streamwijzer::site(), 2);
        assert_eq!(margin.len(), 2);

        // Strict: only the two empty containers are examined.
        let strict = index_listing(&html, &netflixvandaag::site(), 2);
        assert!(strict.is_empty());
    }

    #[test]
    fn test_index_stops_at_limit() {
        let containers: Vec<String> = (0..8).map(|i| teaser(&format!("s{i}"), &format!("S {i}"))).collect();
        let items = index_listing(&listing(&containers), &streamwijzer::site(), 3);
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].title, "S 2");
    }

    #[test]
    fn test_index_falls_back_to_post_divs() {
        let html = r#"<div class="td_module_flex td-post-item"><h3>Via div</h3><a href="/nieuws/div/">x</a></div>"#;
        let items = index_listing(html, &streamwijzer::site(), 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.streamwijzer.nl/nieuws/div/");
    }

    #[test]
    fn test_index_placeholder_title() {
        let html = r#"<article><h2><a href="/nieuws/x/"><img src="/x.jpg"></a></h2></article>"#;
        let items = index_listing(html, &streamwijzer::site(), 5);
        assert_eq!(items[0].title, TITLE_PLACEHOLDER);
    }

    #[test]
    fn test_index_no_containers() {
        let items = index_listing("<html><body><p>Onderhoud</p></body></html>", &streamwijzer::site(), 5);
        assert!(items.is_empty());
    }

    fn item() -> ListingItem {
        ListingItem {
            url: "https://www.streamwijzer.nl/nieuws/a/".to_string(),
            title: "A".to_string(),
            image_url: "https://www.streamwijzer.nl/thumb.jpg".to_string(),
            date: "2026-10-18".to_string(),
            teaser: "Teaser A".to_string(),
        }
    }

    #[test]
    fn test_assemble_listing_image_preferred_for_streamwijzer() {
        let long = "Lange tekst over de serie. ".repeat(10);
        let record = assemble(item(), Some(detail(&long).as_str()), &streamwijzer::site());
        assert_eq!(record.image_url, "https://www.streamwijzer.nl/thumb.jpg");
        assert!(record.excerpt.starts_with("Lange tekst"));
        assert_eq!(record.source, Source::Streamwijzer);
        assert!(record.scheduled_time.is_none());
    }

    #[test]
    fn test_assemble_detail_image_when_teaser_has_none() {
        let mut no_image = item();
        no_image.image_url.clear();
        let record = assemble(no_image, Some(detail("tekst").as_str()), &streamwijzer::site());
        assert_eq!(record.image_url, "https://cdn.example.com/hi-res.jpg");
    }

    #[test]
    fn test_assemble_detail_image_preferred_for_netflixvandaag() {
        let record = assemble(item(), Some(detail("tekst").as_str()), &netflixvandaag::site());
        assert_eq!(record.image_url, "https://cdn.example.com/hi-res.jpg");

        let fallback = assemble(item(), Some("<html></html>"), &netflixvandaag::site());
        assert_eq!(fallback.image_url, "https://www.streamwijzer.nl/thumb.jpg");
    }

    #[test]
    fn test_assemble_short_body_uses_teaser_then_placeholder() {
        let record = assemble(item(), Some(detail("Te kort").as_str()), &streamwijzer::site());
        assert_eq!(record.excerpt, "Teaser A");

        let mut bare = item();
        bare.teaser.clear();
        let record = assemble(bare, None, &streamwijzer::site());
        assert_eq!(record.excerpt, EXCERPT_PLACEHOLDER);
    }

    #[test]
    fn test_assemble_caps_long_teaser() {
        let mut long = item();
        long.teaser = "t".repeat(6000);
        let record = assemble(long, None, &streamwijzer::site());
        assert!(record.excerpt.ends_with(TRUNCATION_MARKER));
        assert_eq!(record.excerpt.chars().count(), 5000 + TRUNCATION_MARKER.len());
    }

    #[tokio::test]
    async fn test_scrape_three_valid_containers_with_limit_five() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        let html = listing(&[teaser("een", "Een"), teaser("twee", "Twee"), teaser("drie", "Drie")]);

        Mock::given(method("GET"))
            .and(path("/nieuws/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;
        for slug in ["een", "twee", "drie"] {
            Mock::given(method("GET"))
                .and(path(format!("/nieuws/{slug}/")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(detail(&format!("Volledig artikel {slug}. ").repeat(10))),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let config = test_config(5);
        let fetcher = Fetcher::new().unwrap();
        let scraper = SourceScraper::new(&fetcher, &config);
        let site = mock_site(&base, streamwijzer::site());
        let articles = scraper.scrape(&site).await;

        assert_eq!(articles.len(), 3);
        for article in &articles {
            assert_ne!(article.title, TITLE_PLACEHOLDER);
            assert!(article.url.starts_with(&server.uri()));
            assert!(article.excerpt.starts_with("Volledig artikel"));
        }
        let urls: HashSet<&str> = articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls.len(), 3);
    }

    #[tokio::test]
    async fn test_scrape_spaces_detail_fetches() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        Mock::given(method("GET"))
            .and(path("/nieuws/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
                teaser("een", "Een"),
                teaser("twee", "Twee"),
                teaser("drie", "Drie"),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::path_regex(r"^/nieuws/[a-z]+/$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail("Tekst")))
            .expect(3)
            .mount(&server)
            .await;

        let delay = Duration::from_millis(150);
        let config = Config {
            detail_delay: delay,
            ..test_config(5)
        };
        let fetcher = Fetcher::new().unwrap();
        let scraper = SourceScraper::new(&fetcher, &config);

        let started = std::time::Instant::now();
        let articles = scraper.scrape(&mock_site(&base, streamwijzer::site())).await;
        assert_eq!(articles.len(), 3);
        // Two pauses for three detail pages, none before the first.
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_scrape_listing_failure_yields_empty() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        Mock::given(method("GET"))
            .and(path("/nieuws/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = test_config(5);
        let fetcher = Fetcher::new().unwrap();
        let scraper = SourceScraper::new(&fetcher, &config);
        let articles = scraper.scrape(&mock_site(&base, streamwijzer::site())).await;
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_detail_failure_keeps_listing_data() {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri()).unwrap();
        Mock::given(method("GET"))
            .and(path("/nieuws/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[teaser("weg", "Weg")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nieuws/weg/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = test_config(5);
        let fetcher = Fetcher::new().unwrap();
        let scraper = SourceScraper::new(&fetcher, &config);
        let articles = scraper.scrape(&mock_site(&base, streamwijzer::site())).await;

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].excerpt, "Teaser voor Weg");
        assert_eq!(articles[0].image_url, format!("{}/img/weg.jpg", server.uri()));
    }
}
