//! Crawl orchestration.
//!
//! The coordinator ties the pipeline together: it drives the frontier (or a
//! fixed URL list), fetches and extracts each page, persists records and
//! embeddings through the store, and reports an aggregate result with a
//! terminal status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CrawlConfig;
use crate::embedding::{EmbeddingGenerator, EmbeddingModel};
use crate::error::CrawlError;
use crate::extractor::ContentExtractor;
use crate::fetcher::PageFetch;
use crate::frontier::{canonicalize, FrontierScheduler};
use crate::store::PageStore;

/// Only the first few failures are carried in the result; the rest are
/// logged.
pub const MAX_REPORTED_ERRORS: usize = 5;

/// The site being crawled, as known to the caller.
#[derive(Debug, Clone)]
pub struct SiteDescriptor {
    pub id: u64,
    /// Bare domain (`example.com`) or a full root URL.
    pub domain: String,
}

/// Terminal and in-flight crawl states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    Pending,
    Running,
    Completed,
    /// Nothing was crawled and at least one page failed.
    Failed,
    Cancelled,
}

/// Aggregate counters for one crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Pages attempted (frontier visits or explicit URLs).
    pub total_pages: usize,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    /// First [`MAX_REPORTED_ERRORS`] failure messages, `url: error`.
    pub errors: Vec<String>,
}

impl CrawlResult {
    fn record_failure(&mut self, url: &str, error: &CrawlError) {
        self.pages_failed += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(format!("{url}: {error}"));
        } else {
            warn!(url, %error, "page failed (error list full)");
        }
    }
}

/// Final status plus counters.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub status: CrawlStatus,
    pub result: CrawlResult,
}

/// Cooperative cancellation handle. Clone it out before starting the crawl
/// and flip it from anywhere; the coordinator checks between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a full crawl against pluggable fetch, embedding, and storage
/// backends.
pub struct CrawlCoordinator<F, M, S> {
    config: CrawlConfig,
    fetcher: F,
    model: M,
    store: S,
    extractor: ContentExtractor,
    generator: EmbeddingGenerator,
    cancel: CancelFlag,
}

impl<F, M, S> CrawlCoordinator<F, M, S>
where
    F: PageFetch,
    M: EmbeddingModel,
    S: PageStore,
{
    #[must_use]
    pub fn new(config: CrawlConfig, fetcher: F, model: M, store: S) -> Self {
        let generator = EmbeddingGenerator::new(config.chunk_size(), config.chunk_overlap());
        Self {
            config,
            fetcher,
            model,
            store,
            extractor: ContentExtractor::new(),
            generator,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle for cancelling this crawl from another task.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The fetch backend, for inspection after a run.
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Crawl `site`. With `explicit_urls` the crawl is directed: exactly
    /// those URLs, no link expansion. Without, a breadth-first discovery
    /// crawl starts from the site root.
    pub async fn crawl_site(
        &self,
        site: &SiteDescriptor,
        explicit_urls: Option<Vec<String>>,
    ) -> Result<CrawlOutcome, CrawlError> {
        info!(site = %site.domain, directed = explicit_urls.is_some(), "crawl starting");
        let outcome = match explicit_urls {
            Some(urls) => self.crawl_directed(site, urls).await,
            None => self.crawl_discovery(site).await,
        };
        info!(
            site = %site.domain,
            status = ?outcome.status,
            crawled = outcome.result.pages_crawled,
            failed = outcome.result.pages_failed,
            "crawl finished"
        );
        Ok(outcome)
    }

    async fn crawl_directed(&self, site: &SiteDescriptor, urls: Vec<String>) -> CrawlOutcome {
        let mut result = CrawlResult {
            total_pages: urls.len(),
            ..CrawlResult::default()
        };
        for url in urls {
            if self.cancel.is_cancelled() {
                return CrawlOutcome {
                    status: CrawlStatus::Cancelled,
                    result,
                };
            }
            let url = canonicalize(&url);
            self.process_page(site, &url, &mut result).await;
        }
        finish(result)
    }

    async fn crawl_discovery(&self, site: &SiteDescriptor) -> CrawlOutcome {
        let root = if site.domain.starts_with("http://") || site.domain.starts_with("https://") {
            site.domain.clone()
        } else {
            format!("https://{}", site.domain)
        };
        let mut frontier = FrontierScheduler::new(self.config.max_pages(), self.config.max_depth());
        frontier.seed(root, 0);

        let mut result = CrawlResult::default();
        while let Some(entry) = frontier.next_url() {
            if self.cancel.is_cancelled() {
                result.total_pages = frontier.visited_count();
                return CrawlOutcome {
                    status: CrawlStatus::Cancelled,
                    result,
                };
            }
            let record = self.process_page(site, &entry.url, &mut result).await;
            if let Some(record) = record
                && entry.depth < self.config.max_depth()
            {
                frontier.push_links(record.internal_links(), entry.depth + 1);
            }
        }
        result.total_pages = frontier.visited_count();
        finish(result)
    }

    /// Fetch, extract, persist, and embed one page. Returns the record on
    /// success so discovery crawls can expand its links. Embedding failure
    /// is non-fatal: the page stays persisted without vectors.
    async fn process_page(
        &self,
        site: &SiteDescriptor,
        url: &str,
        result: &mut CrawlResult,
    ) -> Option<crate::extractor::PageRecord> {
        let fetched = match self.fetcher.fetch(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                result.record_failure(url, &e);
                return None;
            }
        };

        let record = self
            .extractor
            .extract(&fetched.url, &fetched.html, fetched.status_code);

        let page_id = match self.store.upsert_page(site.id, &record).await {
            Ok(id) => id,
            Err(e) => {
                let e = CrawlError::Storage(format!("{e:#}"));
                warn!(url, error = %e, "persist failed");
                result.record_failure(url, &e);
                return None;
            }
        };

        match self.generator.generate(&self.model, &record).await {
            Ok(embeddings) => {
                if let Err(e) = self.store.replace_embeddings(page_id, embeddings).await {
                    warn!(url, error = %format!("{e:#}"), "embedding persist failed, page kept");
                }
            }
            Err(e) => {
                warn!(url, error = %format!("{e:#}"), "embedding generation failed, page kept");
            }
        }

        result.pages_crawled += 1;
        Some(record)
    }
}

/// A crawl only fails outright when nothing succeeded and something failed.
fn finish(result: CrawlResult) -> CrawlOutcome {
    let status = if result.pages_crawled == 0 && result.pages_failed > 0 {
        CrawlStatus::Failed
    } else {
        CrawlStatus::Completed
    };
    CrawlOutcome { status, result }
}
