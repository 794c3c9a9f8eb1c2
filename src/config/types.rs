//! Core configuration type for crawl runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use super::builder::CrawlConfigBuilder;

/// Declared user agent for headless crawling. A realistic desktop Chrome UA
/// reduces bot-detection false positives on target sites.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration for one crawl run.
///
/// **INVARIANT:** `max_pages > 0` and `delay_min <= delay_max` — enforced by
/// the builder, relied upon by the frontier and the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub(crate) max_pages: usize,
    pub(crate) max_depth: usize,
    /// Politeness delay bounds in seconds. The fetcher always sleeps the
    /// midpoint of this range after each navigation attempt.
    pub(crate) delay_min: f64,
    pub(crate) delay_max: f64,
    /// Navigation timeout in milliseconds.
    pub(crate) timeout_ms: u64,
    /// Declared but not consulted: robots.txt handling is left to the caller.
    pub(crate) respect_robots: bool,
    pub(crate) user_agent: String,
    /// CDP resource kinds to block per fetch (e.g. `image`, `font`, `media`).
    pub(crate) blocked_resource_kinds: BTreeSet<String>,
    /// Chunk window in characters for embedding generation.
    pub(crate) chunk_size: usize,
    /// Overlap in characters between consecutive chunks.
    pub(crate) chunk_overlap: usize,
    pub(crate) headless: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            max_depth: 5,
            delay_min: 1.0,
            delay_max: 3.0,
            timeout_ms: 30_000,
            respect_robots: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            blocked_resource_kinds: ["image", "font", "media"]
                .into_iter()
                .map(String::from)
                .collect(),
            chunk_size: 1000,
            chunk_overlap: 200,
            headless: true,
        }
    }
}

impl CrawlConfig {
    /// Start building a config with validated bounds.
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::default()
    }

    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn delay_min(&self) -> f64 {
        self.delay_min
    }

    #[must_use]
    pub fn delay_max(&self) -> f64 {
        self.delay_max
    }

    /// Deterministic politeness pause: the midpoint of `[delay_min, delay_max]`.
    #[must_use]
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_min + (self.delay_max - self.delay_min) * 0.5)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    #[must_use]
    pub fn respect_robots(&self) -> bool {
        self.respect_robots
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn blocked_resource_kinds(&self) -> &BTreeSet<String> {
        &self.blocked_resource_kinds
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }
}
