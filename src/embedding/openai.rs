//! OpenAI-compatible embeddings client.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::EmbeddingModel;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_CAP_MS: u64 = 8_000;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding model backed by any OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    #[must_use]
    pub fn new(base_url: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn request(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RequestError {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .context("malformed embedding response")?;
        parsed.data.sort_by_key(|d| d.index);
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow!("embedding response contained no vectors"))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("embedding endpoint returned {status}: {detail}")]
struct RequestError {
    status: u16,
    detail: String,
}

impl RequestError {
    /// Rate limiting and server faults are worth retrying; client errors
    /// are not.
    fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

impl EmbeddingModel for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.request(text).await {
                Ok(vector) => return Ok(vector),
                Err(err) => {
                    let retryable = err
                        .downcast_ref::<RequestError>()
                        .is_some_and(RequestError::is_retryable);
                    if !retryable || attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    let backoff = (BACKOFF_BASE_MS * 2u64.pow(attempt - 1)).min(BACKOFF_CAP_MS);
                    warn!(attempt, backoff_ms = backoff, error = %err, "retrying embedding request");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }
}
