//! Embedding generation over extracted page records.
//!
//! The [`EmbeddingGenerator`] decides what text gets embedded for each page
//! (whole-page preview, overlapping content chunks, and key SEO elements);
//! the actual vector computation is abstracted behind [`EmbeddingModel`] so
//! tests run against a deterministic stub and production runs against an
//! OpenAI-compatible endpoint.

pub mod chunker;
pub mod openai;

pub use chunker::chunk_text;
pub use openai::OpenAiEmbedder;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extractor::PageRecord;

/// Characters of markdown kept in the page-level preview text.
const PAGE_PREVIEW_CHARS: usize = 500;

/// What a stored vector represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingKind {
    Page,
    Chunk,
    Title,
    H1,
    Description,
}

/// One embedding row for a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub kind: EmbeddingKind,
    pub vector: Vec<f32>,
    pub content_text: String,
    /// Position among the page's chunks; `None` for non-chunk kinds.
    pub chunk_index: Option<usize>,
}

/// Computes an embedding vector for a piece of text.
#[allow(async_fn_in_trait)]
pub trait EmbeddingModel {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

impl<T: EmbeddingModel> EmbeddingModel for &T {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text).await
    }
}

/// Drives per-page embedding generation: selects texts, delegates vector
/// computation to the model.
#[derive(Debug, Clone)]
pub struct EmbeddingGenerator {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl EmbeddingGenerator {
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Produce the full embedding set for one page.
    ///
    /// Emits a page-level record when markdown content exists, chunk records
    /// when the content exceeds the configured chunk size, and element
    /// records for non-empty title, h1, and meta description.
    pub async fn generate<M: EmbeddingModel>(
        &self,
        model: &M,
        record: &PageRecord,
    ) -> anyhow::Result<Vec<EmbeddingRecord>> {
        let mut out = Vec::new();

        let content = record.content_md.trim();
        if !content.is_empty() {
            // The vector covers the whole markdown; only the stored text is
            // capped to a preview.
            let vector = model.embed(content).await?;
            out.push(EmbeddingRecord {
                kind: EmbeddingKind::Page,
                vector,
                content_text: page_preview(content),
                chunk_index: None,
            });

            if content.len() > self.chunk_size {
                for (index, chunk) in chunk_text(content, self.chunk_size, self.chunk_overlap)
                    .into_iter()
                    .enumerate()
                {
                    let vector = model.embed(&chunk).await?;
                    out.push(EmbeddingRecord {
                        kind: EmbeddingKind::Chunk,
                        vector,
                        content_text: chunk,
                        chunk_index: Some(index),
                    });
                }
            }
        }

        for (kind, text) in [
            (EmbeddingKind::Title, record.title.trim()),
            (EmbeddingKind::H1, record.h1.trim()),
            (EmbeddingKind::Description, record.description.trim()),
        ] {
            if text.is_empty() {
                continue;
            }
            let vector = model.embed(text).await?;
            out.push(EmbeddingRecord {
                kind,
                vector,
                content_text: text.to_string(),
                chunk_index: None,
            });
        }

        debug!(url = %record.url, embeddings = out.len(), "generated embeddings");
        Ok(out)
    }
}

/// First [`PAGE_PREVIEW_CHARS`] characters of the content, ellipsis-marked
/// when truncated.
fn page_preview(content: &str) -> String {
    if content.chars().count() <= PAGE_PREVIEW_CHARS {
        return content.to_string();
    }
    let mut preview: String = content.chars().take(PAGE_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
