//! Error taxonomy for crawl operations.
//!
//! Fatal errors (session launch, invalid configuration) abort the crawl and
//! surface to the caller. Everything else is degraded or counted per page by
//! the coordinator; expected failure modes are reported through `CrawlResult`,
//! never thrown out of the crawl loop.

use thiserror::Error;

/// Errors produced by the crawl pipeline.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Browser or browsing context failed to launch. Fatal: no partial
    /// browser state is usable, the crawl aborts before any page is processed.
    #[error("browser session error: {0}")]
    Session(String),

    /// Navigation failed after retries, or the response carried status >= 400.
    /// Counted as a page failure by the coordinator.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Page markup could not be processed. Extraction degrades field-by-field,
    /// so this only surfaces when an entire document is unusable.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Embedding model call failed. Logged; the page record is still persisted
    /// without embeddings.
    #[error("embedding generation failed: {0}")]
    Embedding(String),

    /// Persistence collaborator rejected a write. Counted as a page failure.
    #[error("persistence failed: {0}")]
    Storage(String),

    /// Configuration rejected at build time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Crawl was cancelled externally between frontier iterations.
    #[error("crawl cancelled")]
    Cancelled,
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} preserves the full context chain
        Self::Navigation(format!("{err:#}"))
    }
}
