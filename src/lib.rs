//! Headless-browser SEO crawler and content pipeline.
//!
//! Crawls a site through real Chromium rendering, extracts structured SEO
//! data from each page, normalizes main content to markdown, and generates
//! embeddings for semantic search. The pipeline splits into pluggable
//! stages: [`browser`] and [`fetcher`] render pages, [`frontier`] schedules
//! discovery, [`extractor`] and [`normalizer`] produce records, [`embedding`]
//! and [`store`] handle vectors and persistence, and [`coordinator`] drives
//! the whole crawl.
//!
//! ```no_run
//! use seocrawl::{crawl_site, CrawlConfig, MemoryPageStore, OpenAiEmbedder, SiteDescriptor};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let site = SiteDescriptor { id: 1, domain: "example.com".into() };
//! let config = CrawlConfig::builder().max_pages(50).build()?;
//! let model = OpenAiEmbedder::new("https://api.openai.com/v1", "sk-...", "text-embedding-3-small");
//! let store = MemoryPageStore::new();
//! let outcome = crawl_site(&site, config, None, &model, &store).await?;
//! println!("crawled {} pages", outcome.result.pages_crawled);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod coordinator;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod frontier;
pub mod normalizer;
pub mod store;

pub use browser::BrowserSession;
pub use config::{CrawlConfig, CrawlConfigBuilder, DEFAULT_USER_AGENT};
pub use coordinator::{
    CancelFlag, CrawlCoordinator, CrawlOutcome, CrawlResult, CrawlStatus, SiteDescriptor,
};
pub use embedding::{
    EmbeddingGenerator, EmbeddingKind, EmbeddingModel, EmbeddingRecord, OpenAiEmbedder,
};
pub use error::CrawlError;
pub use extractor::{ContentExtractor, ImageRecord, LinkRecord, PageRecord};
pub use fetcher::{BrowserFetcher, FetchedPage, PageFetch};
pub use frontier::FrontierScheduler;
pub use store::{MemoryPageStore, PageId, PageStore};

/// Crawl a site end to end with a real browser session.
///
/// Launches a browser, runs the crawl through a [`CrawlCoordinator`], and
/// tears the session down before returning. `explicit_urls` switches the
/// crawl to directed mode over exactly those URLs. Session startup failure
/// is the only error surfaced here; per-page failures land in the outcome's
/// counters.
pub async fn crawl_site<M, S>(
    site: &SiteDescriptor,
    config: CrawlConfig,
    explicit_urls: Option<Vec<String>>,
    model: &M,
    store: &S,
) -> Result<CrawlOutcome, CrawlError>
where
    M: EmbeddingModel,
    S: PageStore,
{
    let mut session = BrowserSession::start(&config).await?;
    let outcome = {
        let fetcher = BrowserFetcher::new(&session, config.clone());
        let coordinator = CrawlCoordinator::new(config, fetcher, model, store);
        coordinator.crawl_site(site, explicit_urls).await
    };
    session.stop().await;
    outcome
}
