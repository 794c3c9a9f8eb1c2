//! Structured record types produced by extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One anchor found on a page, resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub text: String,
    /// True when the link's hostname matches the page's hostname, or the
    /// href was relative.
    pub is_internal: bool,
}

/// One `<img>` with its `src` resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub src: String,
    pub alt: String,
}

/// SEO-relevant structured data extracted from one fetched page.
///
/// Produced once per fetch and immutable once handed to persistence; a later
/// re-crawl produces a new record keyed by `(site_id, url)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub status_code: u16,
    /// `rel=canonical` href, empty if absent.
    pub canonical: String,
    /// `meta[name=robots]` content, empty if absent.
    pub meta_robots: String,
    /// Isolated main-content HTML subtree.
    pub content_html: String,
    /// Normalized markdown rendition of `content_html`.
    pub content_md: String,
    /// Whitespace-split token count of `content_md`.
    pub word_count: usize,
    pub title: String,
    pub description: String,
    /// Text of the first `<h1>`, empty if none.
    pub h1: String,
    /// Text of every `<h2>` in document order.
    pub h2_list: Vec<String>,
    /// Merged `og:*` and `twitter:*` meta properties; later tags overwrite
    /// earlier ones on key collision.
    pub og_map: HashMap<String, String>,
    /// Every JSON-LD block that parsed; malformed blocks are skipped.
    pub schema_list: Vec<serde_json::Value>,
    pub links: Vec<LinkRecord>,
    pub images: Vec<ImageRecord>,
    pub crawled_at: DateTime<Utc>,
}

impl PageRecord {
    /// Absolute URLs of internal links, used for frontier expansion.
    #[must_use]
    pub fn internal_links(&self) -> Vec<String> {
        self.links
            .iter()
            .filter(|link| link.is_internal)
            .map(|link| link.url.clone())
            .collect()
    }
}
