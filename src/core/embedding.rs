//! Embedding provider client.
//!
//! The engine never computes vectors itself; it calls an external
//! provider over HTTP. `Embedder` is the seam: the indexer and
//! retriever only see the trait, so tests swap in deterministic
//! implementations and a different provider only needs a new impl.
//!
//! `OllamaEmbedder` speaks the Ollama `/api/embed` protocol: POST
//! `{"model": ..., "input": ...}` where input is a single string or
//! an array, response `{"embeddings": [[...], ...]}` in input order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::error::{DocbaseError, Result};

/// Produces embedding vectors for chunk and query text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order.
    ///
    /// All-or-nothing: any provider failure fails the whole batch.
    /// No partial results are ever returned.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The vector dimension this embedder is configured for.
    fn dimension(&self) -> usize;
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP client for an Ollama-compatible embedding endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    /// Create a client for the given endpoint and model.
    ///
    /// The timeout covers the whole request; batch embedding of a
    /// large document can take tens of seconds on CPU-bound
    /// providers.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocbaseError::ConfigError(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
        })
    }

    async fn request(&self, input: EmbedInput<'_>, expected_count: usize) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocbaseError::EmbeddingUnavailable(format!(
                        "embedding request timed out: {e}"
                    ))
                } else {
                    DocbaseError::EmbeddingUnavailable(format!("embedding request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DocbaseError::EmbeddingUnavailable(format!(
                "embedding provider returned {status}: {detail}"
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            DocbaseError::EmbeddingUnavailable(format!("invalid embedding response: {e}"))
        })?;

        if parsed.embeddings.len() != expected_count {
            return Err(DocbaseError::EmbeddingUnavailable(format!(
                "embedding count mismatch: sent {expected_count}, got {}",
                parsed.embeddings.len()
            )));
        }

        for vector in &parsed.embeddings {
            if vector.len() != self.dimension {
                return Err(DocbaseError::EmbeddingDimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        debug!(
            count = parsed.embeddings.len(),
            dimension = self.dimension,
            "embeddings received"
        );
        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(EmbedInput::Single(text), 1).await?;
        // Length checked in request()
        Ok(vectors.remove(0))
    }

    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(EmbedInput::Batch(texts), texts.len()).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
