//! Structured SEO extraction from fetched page DOMs.
//!
//! Parses a fetched page's HTML into a [`PageRecord`]: document metadata,
//! headings, Open Graph / Twitter properties, JSON-LD blocks, resolved links
//! and images, plus the normalized markdown rendition of the page's main
//! content. Extraction degrades gracefully: missing or malformed markup turns
//! into empty fields, never an aborted page.

pub mod content;
pub mod schema;

pub use content::isolate_main_content;
pub use schema::{ImageRecord, LinkRecord, PageRecord};

use chrono::Utc;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::normalizer;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("BUG: invalid selector 'title'"));
static DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='description']").expect("BUG: invalid description selector")
});
static CANONICAL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("link[rel='canonical']").expect("BUG: invalid canonical selector")
});
static ROBOTS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='robots']").expect("BUG: invalid robots selector")
});
static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("BUG: invalid selector 'h1'"));
static H2_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("BUG: invalid selector 'h2'"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("BUG: invalid selector 'meta'"));
static JSON_LD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("BUG: invalid JSON-LD selector")
});
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("BUG: invalid selector 'img'"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: invalid anchor selector"));

/// Parses fetched DOMs into structured records. Owned by the coordinator and
/// passed by reference; carries no per-crawl state.
#[derive(Debug, Default, Clone)]
pub struct ContentExtractor;

impl ContentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract a full [`PageRecord`] from a fetched page.
    #[must_use]
    pub fn extract(&self, url: &str, html: &str, status_code: u16) -> PageRecord {
        let document = Html::parse_document(html);
        let base = Url::parse(url).ok();

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| collapse_text(el.text()))
            .unwrap_or_default();
        let description = meta_content(&document, &DESCRIPTION_SELECTOR);
        let canonical = document
            .select(&CANONICAL_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("href"))
            .unwrap_or_default()
            .to_string();
        let meta_robots = meta_content(&document, &ROBOTS_SELECTOR);

        let h1 = document
            .select(&H1_SELECTOR)
            .next()
            .map(|el| collapse_text(el.text()))
            .unwrap_or_default();
        let h2_list: Vec<String> = document
            .select(&H2_SELECTOR)
            .map(|el| collapse_text(el.text()))
            .collect();

        let og_map = extract_social_meta(&document);
        let schema_list = extract_json_ld(&document);
        let images = extract_images(&document, base.as_ref());
        let links = extract_links(&document, base.as_ref());

        let content_html = isolate_main_content(html);
        let content_md = normalizer::html_to_markdown(&content_html);
        let word_count = content_md.split_whitespace().count();

        debug!(
            url,
            word_count,
            links = links.len(),
            images = images.len(),
            "extracted page record"
        );

        PageRecord {
            url: url.to_string(),
            status_code,
            canonical,
            meta_robots,
            content_html,
            content_md,
            word_count,
            title,
            description,
            h1,
            h2_list,
            og_map,
            schema_list,
            links,
            images,
            crawled_at: Utc::now(),
        }
    }
}

/// `content` attribute of the first element matching `selector`.
fn meta_content(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .to_string()
}

/// Merge `og:*` and `twitter:*` meta tags into one map, stripping the prefix.
///
/// Open Graph tags are walked first, then Twitter tags, so a colliding
/// Twitter key overwrites the Open Graph value: last write wins in tag
/// encounter order.
fn extract_social_meta(document: &Html) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for el in document.select(&META_SELECTOR) {
        if let (Some(property), Some(content)) =
            (el.value().attr("property"), el.value().attr("content"))
            && let Some(key) = property.strip_prefix("og:")
        {
            map.insert(key.to_string(), content.to_string());
        }
    }
    for el in document.select(&META_SELECTOR) {
        if let (Some(name), Some(content)) = (el.value().attr("name"), el.value().attr("content"))
            && let Some(key) = name.strip_prefix("twitter:")
        {
            map.insert(key.to_string(), content.to_string());
        }
    }
    map
}

/// Parse every JSON-LD block; malformed blocks are skipped, never fatal.
fn extract_json_ld(document: &Html) -> Vec<serde_json::Value> {
    document
        .select(&JSON_LD_SELECTOR)
        .filter_map(|el| {
            let raw: String = el.text().collect();
            match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!(error = %err, "skipping malformed JSON-LD block");
                    None
                }
            }
        })
        .collect()
}

fn extract_images(document: &Html, base: Option<&Url>) -> Vec<ImageRecord> {
    document
        .select(&IMG_SELECTOR)
        .filter_map(|el| {
            let src = el.value().attr("src")?;
            if src.is_empty() {
                return None;
            }
            let alt = el.value().attr("alt").unwrap_or_default().to_string();
            Some(ImageRecord {
                src: resolve_url(src, base)?,
                alt,
            })
        })
        .collect()
}

fn extract_links(document: &Html, base: Option<&Url>) -> Vec<LinkRecord> {
    let page_host = base.and_then(|b| b.host_str().map(str::to_string));
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let text = collapse_text(el.text());
            if href.starts_with("http://") || href.starts_with("https://") {
                let link_host = Url::parse(href).ok()?.host_str().map(str::to_string);
                let is_internal = link_host.is_some() && link_host == page_host;
                Some(LinkRecord {
                    url: href.to_string(),
                    text,
                    is_internal,
                })
            } else {
                // Relative hrefs resolve against the page and are internal by
                // definition.
                Some(LinkRecord {
                    url: resolve_url(href, base)?,
                    text,
                    is_internal: true,
                })
            }
        })
        .collect()
}

/// Resolve a possibly-relative URL against the page base.
fn resolve_url(candidate: &str, base: Option<&Url>) -> Option<String> {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate.to_string());
    }
    base?.join(candidate).ok().map(|u| u.to_string())
}

/// Element text with inner whitespace collapsed and edges trimmed.
fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let raw: String = parts.collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
