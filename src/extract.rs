//! Field extraction from listing containers and detail pages.
//!
//! Every field is located by an ordered list of [`Strategy`] functions. Each
//! strategy is a pure lookup from an element to an optional value, and
//! [`first_match`] returns the first non-empty result. Extraction never
//! fails: a field that cannot be found degrades to an empty string or a
//! placeholder.
//!
//! | Field | Root | Strategies, in order |
//! |-------|------|----------------------|
//! | Body | detail page | content paragraphs, content text, then `og:description` if short |
//! | Image | container | `srcset` (last candidate), `data-src`/`data-lazy-src`, `src` |
//! | Image | detail page | `og:image`, featured container, CMS-classed `img`, `twitter:image` |
//! | Title | container | `h2`, `h3`, `h1`, class containing `title` |
//! | Date | container | `time[datetime]`, `time` text, class containing `date` |
//! | Teaser | container | first `p`, class containing `excerpt`/`description` |

use crate::scrapers::SiteConfig;
use crate::utils::{collapse_whitespace, today};
use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Maximum excerpt length in characters, before the truncation marker.
pub const MAX_EXCERPT_CHARS: usize = 5000;
/// Appended to an excerpt that was cut at [`MAX_EXCERPT_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";
/// Body text shorter than this is replaced by the `og:description` meta value.
pub const MIN_CONTENT_CHARS: usize = 100;
/// Only the first paragraphs of the content container are kept.
pub const MAX_PARAGRAPHS: usize = 10;
pub const TITLE_PLACEHOLDER: &str = "Geen titel";
pub const EXCERPT_PLACEHOLDER: &str = "Geen content beschikbaar. Check het artikel voor details.";

/// Elements whose text never counts as article content.
const NOISE_TAGS: [&str; 5] = ["script", "style", "iframe", "aside", "nav"];

macro_rules! selector {
    ($s:literal) => {
        Lazy::new(|| Selector::parse($s).expect(concat!("invalid CSS selector: ", $s)))
    };
}

static PARAGRAPH: Lazy<Selector> = selector!("p");
static IMG: Lazy<Selector> = selector!("img");
static IMG_WITH_SRC: Lazy<Selector> = selector!("img[src]");
static TIME: Lazy<Selector> = selector!("time");
static OG_DESCRIPTION: Lazy<Selector> = selector!(r#"meta[property="og:description"]"#);
static OG_IMAGE: Lazy<Selector> = selector!(r#"meta[property="og:image"]"#);
static TWITTER_IMAGE: Lazy<Selector> = selector!(r#"meta[name="twitter:image"]"#);
static HEADINGS: Lazy<[Selector; 3]> = Lazy::new(|| {
    ["h2", "h3", "h1"].map(|h| Selector::parse(h).expect("invalid heading selector"))
});

/// One extraction heuristic: look at `root` and maybe produce a value.
pub type Strategy = fn(ElementRef<'_>, &SiteConfig) -> Option<String>;

pub const BODY_STRATEGIES: &[Strategy] = &[content_paragraphs, content_text];
pub const LISTING_IMAGE_STRATEGIES: &[Strategy] = &[srcset_image, lazy_image, src_image];
pub const DETAIL_IMAGE_STRATEGIES: &[Strategy] = &[
    og_image,
    featured_container_image,
    cms_classed_image,
    twitter_image,
];
pub const TITLE_STRATEGIES: &[Strategy] = &[heading_title, classed_title];
pub const DATE_STRATEGIES: &[Strategy] = &[time_datetime, time_text, classed_date];
pub const TEASER_STRATEGIES: &[Strategy] = &[teaser_paragraph, classed_teaser];

/// Run `strategies` in order and return the first non-blank value.
pub fn first_match(root: ElementRef<'_>, site: &SiteConfig, strategies: &[Strategy]) -> Option<String> {
    strategies
        .iter()
        .find_map(|strategy| strategy(root, site).filter(|value| !value.trim().is_empty()))
}

// ---------------------------------------------------------------------------
// Field drivers
// ---------------------------------------------------------------------------

/// Extract the article body from a detail page.
///
/// Returns an empty string when nothing usable was found. The result is
/// already capped with [`truncate_excerpt`].
pub fn extract_body(document: &Html, site: &SiteConfig) -> String {
    let root = document.root_element();
    let mut text = first_match(root, site, BODY_STRATEGIES).unwrap_or_default();
    if text.chars().count() < MIN_CONTENT_CHARS {
        if let Some(description) = og_description(root, site).filter(|d| !d.trim().is_empty()) {
            text = description;
        }
    }
    truncate_excerpt(text)
}

/// Absolute image URL from a listing container, or empty.
pub fn listing_image(container: ElementRef<'_>, site: &SiteConfig) -> String {
    first_match(container, site, LISTING_IMAGE_STRATEGIES)
        .and_then(|raw| absolutize(&site.origin, &raw))
        .unwrap_or_default()
}

/// Absolute image URL from a detail page, or empty.
pub fn detail_image(document: &Html, site: &SiteConfig) -> String {
    first_match(document.root_element(), site, DETAIL_IMAGE_STRATEGIES)
        .and_then(|raw| absolutize(&site.origin, &raw))
        .unwrap_or_default()
}

/// Title text of a listing container.
///
/// `None` when the container has no title element at all. A title element
/// without text yields [`TITLE_PLACEHOLDER`].
pub fn extract_title(container: ElementRef<'_>, site: &SiteConfig) -> Option<String> {
    if let Some(title) = first_match(container, site, TITLE_STRATEGIES) {
        return Some(title);
    }
    has_title_element(container).then(|| TITLE_PLACEHOLDER.to_string())
}

/// Publication date of a listing container, or today's date.
pub fn extract_date(container: ElementRef<'_>, site: &SiteConfig) -> String {
    first_match(container, site, DATE_STRATEGIES).unwrap_or_else(today)
}

/// Short teaser text shown on the listing page, or empty.
pub fn extract_teaser(container: ElementRef<'_>, site: &SiteConfig) -> String {
    first_match(container, site, TEASER_STRATEGIES).unwrap_or_default()
}

/// Cap `text` at [`MAX_EXCERPT_CHARS`] characters, appending [`TRUNCATION_MARKER`] when cut.
pub fn truncate_excerpt(text: String) -> String {
    match text.char_indices().nth(MAX_EXCERPT_CHARS) {
        None => text,
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
    }
}

/// Resolve `raw` against the site origin.
///
/// Absolute URLs pass through; root-relative and protocol-relative ones are
/// joined to `origin`. `None` for blank input, inline `data:` images, or
/// values that do not form a URL.
pub fn absolutize(origin: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    origin.join(raw).ok().map(|url| url.to_string())
}

// ---------------------------------------------------------------------------
// Body strategies
// ---------------------------------------------------------------------------

fn content_container<'a>(root: ElementRef<'a>, site: &SiteConfig) -> Option<ElementRef<'a>> {
    site.content_selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| root.select(&selector).next())
}

/// Text of the first [`MAX_PARAGRAPHS`] paragraphs, separated by blank lines.
pub fn content_paragraphs(root: ElementRef<'_>, site: &SiteConfig) -> Option<String> {
    let container = content_container(root, site)?;
    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .filter(|p| !inside_noise(*p, container))
        .take(MAX_PARAGRAPHS)
        .map(visible_text)
        .filter(|text| !text.is_empty())
        .collect();
    Some(paragraphs.join("\n\n"))
}

/// All visible text of the content container.
pub fn content_text(root: ElementRef<'_>, site: &SiteConfig) -> Option<String> {
    content_container(root, site).map(visible_text)
}

pub fn og_description(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    meta_content(root, &OG_DESCRIPTION)
}

// ---------------------------------------------------------------------------
// Image strategies
// ---------------------------------------------------------------------------

/// Highest-resolution candidate of the first image's `srcset`.
pub fn srcset_image(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    let img = root.select(&IMG).next()?;
    img.value().attr("srcset").and_then(last_srcset_candidate)
}

pub fn lazy_image(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    let img = root.select(&IMG).next()?;
    ["data-src", "data-lazy-src"]
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .find(|value| usable_image(value))
        .map(str::to_string)
}

pub fn src_image(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    let img = root.select(&IMG).next()?;
    img.value()
        .attr("src")
        .filter(|src| usable_image(src))
        .map(str::to_string)
}

pub fn og_image(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    meta_content(root, &OG_IMAGE)
}

/// Image inside the site's featured-image wrapper.
pub fn featured_container_image(root: ElementRef<'_>, site: &SiteConfig) -> Option<String> {
    let wrapper = Selector::parse(site.featured_image_selector).ok()?;
    let container = root.select(&wrapper).next()?;
    let img = container.select(&IMG_WITH_SRC).next()?;
    img.value()
        .attr("srcset")
        .and_then(last_srcset_candidate)
        .or_else(|| img.value().attr("src").map(str::to_string))
}

/// An `img` whose class marks it as the post's featured image.
pub fn cms_classed_image(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    root.select(&IMG_WITH_SRC)
        .find(|img| has_class_fragment(*img, &["wp-post-image", "featured"]))
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

pub fn twitter_image(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    meta_content(root, &TWITTER_IMAGE)
}

fn last_srcset_candidate(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .last()
        .map(str::to_string)
}

fn usable_image(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.starts_with("data:")
}

// ---------------------------------------------------------------------------
// Title, date and teaser strategies
// ---------------------------------------------------------------------------

pub fn heading_title(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    HEADINGS
        .iter()
        .filter_map(|heading| root.select(heading).next())
        .map(visible_text)
        .find(|text| !text.is_empty())
}

pub fn classed_title(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    first_with_class_fragment(root, &["title"]).map(visible_text)
}

fn has_title_element(root: ElementRef<'_>) -> bool {
    HEADINGS.iter().any(|heading| root.select(heading).next().is_some())
        || first_with_class_fragment(root, &["title"]).is_some()
}

/// Machine-readable `datetime` attribute of the first `time` element.
pub fn time_datetime(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    let time = root.select(&TIME).next()?;
    time.value().attr("datetime").map(|d| d.trim().to_string())
}

pub fn time_text(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    root.select(&TIME).next().map(visible_text)
}

pub fn classed_date(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    first_with_class_fragment(root, &["date"]).map(visible_text)
}

pub fn teaser_paragraph(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    root.select(&PARAGRAPH).next().map(visible_text)
}

pub fn classed_teaser(root: ElementRef<'_>, _site: &SiteConfig) -> Option<String> {
    first_with_class_fragment(root, &["excerpt", "description"]).map(visible_text)
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn meta_content(root: ElementRef<'_>, selector: &Selector) -> Option<String> {
    root.select(selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

/// Case-insensitive check of the `class` attribute against `fragments`.
fn has_class_fragment(element: ElementRef<'_>, fragments: &[&str]) -> bool {
    element.value().attr("class").is_some_and(|class| {
        let class = class.to_lowercase();
        fragments.iter().any(|fragment| class.contains(fragment))
    })
}

/// First descendant (excluding `root`) whose class contains one of `fragments`.
fn first_with_class_fragment<'a>(root: ElementRef<'a>, fragments: &[&str]) -> Option<ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| has_class_fragment(*element, fragments))
}

fn is_noise(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|element| NOISE_TAGS.contains(&element.name()))
}

/// Whether `element` sits inside a noise element below `boundary`.
fn inside_noise(element: ElementRef<'_>, boundary: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .take_while(|ancestor| ancestor.id() != boundary.id())
        .any(|ancestor| is_noise(ancestor.value()))
}

/// Text of `element` with noise subtrees removed and whitespace collapsed.
pub fn visible_text(element: ElementRef<'_>) -> String {
    if NOISE_TAGS.contains(&element.value().name()) {
        return String::new();
    }
    let mut text = String::new();
    for node in element.descendants() {
        if let Node::Text(chunk) = node.value() {
            let hidden = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .any(|ancestor| is_noise(ancestor.value()));
            if !hidden {
                text.push_str(chunk);
            }
        }
    }
    collapse_whitespace(&text)
}
