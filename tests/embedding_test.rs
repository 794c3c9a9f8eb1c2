//! Embedding generation: which texts get embedded for a page.

use std::sync::Mutex;

use chrono::Utc;
use seocrawl::{EmbeddingGenerator, EmbeddingKind, EmbeddingModel, PageRecord};

struct RecordingModel {
    texts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn new() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
        }
    }
}

impl EmbeddingModel for RecordingModel {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(vec![1.0; 4])
    }
}

fn record(content_md: &str, title: &str, h1: &str, description: &str) -> PageRecord {
    PageRecord {
        url: "https://example.com/page".to_string(),
        status_code: 200,
        canonical: String::new(),
        meta_robots: String::new(),
        content_html: String::new(),
        content_md: content_md.to_string(),
        word_count: content_md.split_whitespace().count(),
        title: title.to_string(),
        description: description.to_string(),
        h1: h1.to_string(),
        h2_list: Vec::new(),
        og_map: Default::default(),
        schema_list: Vec::new(),
        links: Vec::new(),
        images: Vec::new(),
        crawled_at: Utc::now(),
    }
}

#[tokio::test]
async fn short_page_gets_page_and_element_embeddings() {
    let generator = EmbeddingGenerator::new(1000, 200);
    let model = RecordingModel::new();
    let page = record("Short content.", "A Title", "The H1", "A description");

    let embeddings = generator.generate(&model, &page).await.unwrap();

    let kinds: Vec<EmbeddingKind> = embeddings.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EmbeddingKind::Page,
            EmbeddingKind::Title,
            EmbeddingKind::H1,
            EmbeddingKind::Description,
        ]
    );
    assert!(embeddings.iter().all(|e| e.chunk_index.is_none()));
}

#[tokio::test]
async fn long_page_gets_chunk_embeddings_with_indices() {
    let generator = EmbeddingGenerator::new(300, 50);
    let model = RecordingModel::new();
    let content = "Sentence about widgets. ".repeat(60);
    let page = record(&content, "", "", "");

    let embeddings = generator.generate(&model, &page).await.unwrap();

    assert_eq!(embeddings[0].kind, EmbeddingKind::Page);
    let chunk_indices: Vec<usize> = embeddings
        .iter()
        .filter(|e| e.kind == EmbeddingKind::Chunk)
        .map(|e| e.chunk_index.unwrap())
        .collect();
    assert!(chunk_indices.len() > 1);
    assert_eq!(chunk_indices, (0..chunk_indices.len()).collect::<Vec<_>>());
}

#[tokio::test]
async fn page_vector_covers_full_markdown_with_truncated_preview() {
    let generator = EmbeddingGenerator::new(10_000, 200);
    let model = RecordingModel::new();
    let content = "x".repeat(2_000);
    let page = record(&content, "", "", "");

    let embeddings = generator.generate(&model, &page).await.unwrap();

    assert_eq!(embeddings.len(), 1);
    assert_eq!(embeddings[0].kind, EmbeddingKind::Page);
    // The model embeds the whole content, not the preview.
    let embedded = model.texts.lock().unwrap();
    assert_eq!(embedded.len(), 1);
    assert_eq!(embedded[0].chars().count(), 2_000);
    // Only the stored text is capped.
    assert_eq!(embeddings[0].content_text.chars().count(), 503);
    assert!(embeddings[0].content_text.ends_with("..."));
}

#[tokio::test]
async fn empty_page_gets_no_embeddings() {
    let generator = EmbeddingGenerator::new(1000, 200);
    let model = RecordingModel::new();
    let page = record("", "", "  ", "");

    let embeddings = generator.generate(&model, &page).await.unwrap();
    assert!(embeddings.is_empty());
    assert!(model.texts.lock().unwrap().is_empty());
}
