//! End-to-end coordinator runs against scripted fetch/model/store backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use seocrawl::{
    CrawlConfig, CrawlCoordinator, CrawlError, CrawlStatus, EmbeddingModel, FetchedPage,
    MemoryPageStore, PageFetch, SiteDescriptor,
};

mod common;

/// Fetcher that serves canned HTML keyed by URL and fails everything else.
struct ScriptedFetcher {
    pages: HashMap<String, (u16, String)>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(pages: Vec<(&str, u16, String)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, status, html)| (url.to_string(), (status, html)))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageFetch for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some((status, _)) if *status >= 400 => Err(CrawlError::Navigation(format!(
                "{url}: HTTP status {status}"
            ))),
            Some((status, html)) => Ok(FetchedPage {
                url: url.to_string(),
                status_code: *status,
                html: html.clone(),
            }),
            None => Err(CrawlError::Navigation(format!("{url}: connection refused"))),
        }
    }
}

/// Deterministic model; optionally fails every call.
struct StubModel {
    fail: bool,
    embedded: Mutex<Vec<String>>,
}

impl StubModel {
    fn new() -> Self {
        Self {
            fail: false,
            embedded: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            embedded: Mutex::new(Vec::new()),
        }
    }
}

impl EmbeddingModel for StubModel {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if self.fail {
            anyhow::bail!("model unavailable");
        }
        self.embedded.lock().unwrap().push(text.to_string());
        Ok(vec![0.1, 0.2, 0.3])
    }
}

fn page_html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a>"))
        .collect();
    format!(
        "<html><head><title>{title}</title></head><body><main>\
         <h1>{title}</h1><p>Content for {title} with enough words to matter.</p>\
         {anchors}</main></body></html>"
    )
}

fn site() -> SiteDescriptor {
    SiteDescriptor {
        id: 7,
        domain: "example.com".to_string(),
    }
}

fn config(max_pages: usize, max_depth: usize) -> CrawlConfig {
    CrawlConfig::builder()
        .max_pages(max_pages)
        .max_depth(max_depth)
        .delay_range(0.0, 0.0)
        .build()
        .unwrap()
}

#[tokio::test]
async fn discovery_crawl_follows_internal_links() {
    common::init_tracing();
    let fetcher = ScriptedFetcher::new(vec![
        (
            "https://example.com",
            200,
            page_html("Root", &["/p1", "https://example.com/p2", "https://other.org/x"]),
        ),
        ("https://example.com/p1", 200, page_html("P1", &[])),
        ("https://example.com/p2", 200, page_html("P2", &[])),
    ]);
    let store = MemoryPageStore::new();
    let coordinator = CrawlCoordinator::new(config(10, 1), fetcher, StubModel::new(), &store);

    let outcome = coordinator.crawl_site(&site(), None).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.result.total_pages, 3);
    assert_eq!(outcome.result.pages_crawled, 3);
    assert_eq!(outcome.result.pages_failed, 0);
    assert!(outcome.result.errors.is_empty());
    assert_eq!(store.page_count().await, 3);
    // The external link never entered the frontier.
    assert!(store.page(7, "https://other.org/x").await.is_none());
}

#[tokio::test]
async fn max_pages_stops_the_crawl() {
    let fetcher = ScriptedFetcher::new(vec![(
        "https://example.com",
        200,
        page_html("Root", &["/p1", "/p2", "/p3"]),
    )]);
    let coordinator = CrawlCoordinator::new(
        config(1, 5),
        fetcher,
        StubModel::new(),
        MemoryPageStore::new(),
    );

    let outcome = coordinator.crawl_site(&site(), None).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.result.pages_crawled, 1);
    assert_eq!(outcome.result.total_pages, 1);
}

#[tokio::test]
async fn directed_crawl_does_not_expand_links() {
    let fetcher = ScriptedFetcher::new(vec![
        (
            "https://example.com/a",
            200,
            page_html("A", &["/never-fetched"]),
        ),
        ("https://example.com/b", 404, String::new()),
    ]);
    let store = MemoryPageStore::new();
    let coordinator = CrawlCoordinator::new(config(10, 5), fetcher, StubModel::new(), &store);

    let outcome = coordinator
        .crawl_site(
            &site(),
            Some(vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.result.total_pages, 2);
    assert_eq!(outcome.result.pages_crawled, 1);
    assert_eq!(outcome.result.pages_failed, 1);
    assert_eq!(outcome.result.errors.len(), 1);
    assert!(outcome.result.errors[0].contains("https://example.com/b"));
    assert!(store.page(7, "https://example.com/never-fetched").await.is_none());
}

#[tokio::test]
async fn crawl_fails_only_when_nothing_succeeds() {
    let fetcher = ScriptedFetcher::new(vec![]);
    let coordinator = CrawlCoordinator::new(
        config(10, 5),
        fetcher,
        StubModel::new(),
        MemoryPageStore::new(),
    );

    let outcome = coordinator
        .crawl_site(&site(), Some(vec!["https://example.com/down".to_string()]))
        .await
        .unwrap();

    assert_eq!(outcome.status, CrawlStatus::Failed);
    assert_eq!(outcome.result.pages_crawled, 0);
    assert_eq!(outcome.result.pages_failed, 1);
}

#[tokio::test]
async fn error_list_is_capped_at_five() {
    let fetcher = ScriptedFetcher::new(vec![]);
    let coordinator = CrawlCoordinator::new(
        config(20, 5),
        fetcher,
        StubModel::new(),
        MemoryPageStore::new(),
    );

    let urls: Vec<String> = (0..8)
        .map(|i| format!("https://example.com/dead/{i}"))
        .collect();
    let outcome = coordinator.crawl_site(&site(), Some(urls)).await.unwrap();

    assert_eq!(outcome.result.pages_failed, 8);
    assert_eq!(outcome.result.errors.len(), 5);
}

#[tokio::test]
async fn cancellation_stops_between_pages() {
    let fetcher = ScriptedFetcher::new(vec![
        ("https://example.com/1", 200, page_html("One", &[])),
        ("https://example.com/2", 200, page_html("Two", &[])),
    ]);
    let coordinator = CrawlCoordinator::new(
        config(10, 5),
        fetcher,
        StubModel::new(),
        MemoryPageStore::new(),
    );
    // Cancel before the crawl starts: no page should be fetched.
    coordinator.cancel_flag().cancel();

    let outcome = coordinator
        .crawl_site(
            &site(),
            Some(vec![
                "https://example.com/1".to_string(),
                "https://example.com/2".to_string(),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, CrawlStatus::Cancelled);
    assert_eq!(outcome.result.pages_crawled, 0);
}

/// Store whose writes always fail.
struct BrokenStore;

impl seocrawl::PageStore for BrokenStore {
    async fn upsert_page(
        &self,
        _site_id: u64,
        _record: &seocrawl::PageRecord,
    ) -> anyhow::Result<seocrawl::PageId> {
        anyhow::bail!("disk full")
    }

    async fn replace_embeddings(
        &self,
        _page_id: seocrawl::PageId,
        _embeddings: Vec<seocrawl::EmbeddingRecord>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

#[tokio::test]
async fn store_failure_counts_as_persistence_error() {
    let fetcher = ScriptedFetcher::new(vec![(
        "https://example.com/solo",
        200,
        page_html("Solo", &[]),
    )]);
    let coordinator = CrawlCoordinator::new(config(10, 5), fetcher, StubModel::new(), BrokenStore);

    let outcome = coordinator
        .crawl_site(&site(), Some(vec!["https://example.com/solo".to_string()]))
        .await
        .unwrap();

    assert_eq!(outcome.status, CrawlStatus::Failed);
    assert_eq!(outcome.result.pages_failed, 1);
    assert!(
        outcome.result.errors[0].contains("persistence failed"),
        "got: {}",
        outcome.result.errors[0]
    );
    assert!(!outcome.result.errors[0].contains("extraction"));
}

#[tokio::test]
async fn embedding_failure_keeps_the_page() {
    let fetcher = ScriptedFetcher::new(vec![(
        "https://example.com/solo",
        200,
        page_html("Solo", &[]),
    )]);
    let store = MemoryPageStore::new();
    let coordinator = CrawlCoordinator::new(config(10, 5), fetcher, StubModel::failing(), &store);

    let outcome = coordinator
        .crawl_site(&site(), Some(vec!["https://example.com/solo".to_string()]))
        .await
        .unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.result.pages_crawled, 1);
    let record = store.page(7, "https://example.com/solo").await.unwrap();
    assert_eq!(record.title, "Solo");
    let page_id = store.page_id(7, "https://example.com/solo").await.unwrap();
    assert!(store.embeddings_for(page_id).await.is_empty());
}

#[tokio::test]
async fn fragment_duplicates_are_fetched_once() {
    let fetcher = ScriptedFetcher::new(vec![(
        "https://example.com",
        200,
        page_html("Root", &["https://example.com#about", "https://example.com#contact"]),
    )]);
    let coordinator = CrawlCoordinator::new(
        config(10, 5),
        fetcher,
        StubModel::new(),
        MemoryPageStore::new(),
    );

    let outcome = coordinator.crawl_site(&site(), None).await.unwrap();
    assert_eq!(outcome.result.pages_crawled, 1);
    assert_eq!(coordinator.fetcher().call_count(), 1);
}
