//! Persistence seam for crawled pages and their embeddings.
//!
//! The coordinator writes through [`PageStore`]; [`MemoryPageStore`] is the
//! in-process implementation used by tests and by callers that post-process
//! results themselves.

use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::embedding::EmbeddingRecord;
use crate::extractor::PageRecord;

pub type PageId = u64;

/// Upsert-style sink for crawl output. Pages are keyed by `(site_id, url)`;
/// re-crawling a URL replaces the prior record and its embeddings.
#[allow(async_fn_in_trait)]
pub trait PageStore {
    async fn upsert_page(&self, site_id: u64, record: &PageRecord) -> anyhow::Result<PageId>;

    /// Replace all embeddings for a page with `embeddings`.
    async fn replace_embeddings(
        &self,
        page_id: PageId,
        embeddings: Vec<EmbeddingRecord>,
    ) -> anyhow::Result<()>;
}

impl<T: PageStore> PageStore for &T {
    async fn upsert_page(&self, site_id: u64, record: &PageRecord) -> anyhow::Result<PageId> {
        (**self).upsert_page(site_id, record).await
    }

    async fn replace_embeddings(
        &self,
        page_id: PageId,
        embeddings: Vec<EmbeddingRecord>,
    ) -> anyhow::Result<()> {
        (**self).replace_embeddings(page_id, embeddings).await
    }
}

#[derive(Default)]
struct MemoryState {
    pages: HashMap<(u64, String), (PageId, PageRecord)>,
    embeddings: HashMap<PageId, Vec<EmbeddingRecord>>,
    next_id: PageId,
}

/// In-memory [`PageStore`].
#[derive(Default)]
pub struct MemoryPageStore {
    state: Mutex<MemoryState>,
}

impl MemoryPageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn page_count(&self) -> usize {
        self.state.lock().await.pages.len()
    }

    pub async fn page(&self, site_id: u64, url: &str) -> Option<PageRecord> {
        self.state
            .lock()
            .await
            .pages
            .get(&(site_id, url.to_string()))
            .map(|(_, record)| record.clone())
    }

    pub async fn embeddings_for(&self, page_id: PageId) -> Vec<EmbeddingRecord> {
        self.state
            .lock()
            .await
            .embeddings
            .get(&page_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn page_id(&self, site_id: u64, url: &str) -> Option<PageId> {
        self.state
            .lock()
            .await
            .pages
            .get(&(site_id, url.to_string()))
            .map(|(id, _)| *id)
    }
}

impl PageStore for MemoryPageStore {
    async fn upsert_page(&self, site_id: u64, record: &PageRecord) -> anyhow::Result<PageId> {
        let mut state = self.state.lock().await;
        let key = (site_id, record.url.clone());
        if let Some((existing, _)) = state.pages.get(&key) {
            let id = *existing;
            state.pages.insert(key, (id, record.clone()));
            return Ok(id);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.pages.insert(key, (id, record.clone()));
        Ok(id)
    }

    async fn replace_embeddings(
        &self,
        page_id: PageId,
        embeddings: Vec<EmbeddingRecord>,
    ) -> anyhow::Result<()> {
        self.state.lock().await.embeddings.insert(page_id, embeddings);
        Ok(())
    }
}
