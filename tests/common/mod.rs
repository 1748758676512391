//! Shared fixtures and helpers for integration tests.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use uuid::Uuid;

use docbase::core::error::{DocbaseError, Result};
use docbase::{
    ChunkStore, Config, EmbeddedChunk, Embedder, InMemoryChunkStore, ScoredChunk, Services,
};

/// Vector dimension used across the integration tests. Large enough
/// that token-hash collisions stay rare.
pub const TEST_DIM: usize = 32;

static TRACING: Once = Once::new();

/// Install a test subscriber once per process; `RUST_LOG` controls
/// verbosity.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Employee handbook fixture with numbered headings.
pub const HANDBOOK: &str = "\
1. Leave Policy
Employees receive 25 days of annual leave each calendar year.
Unused annual leave can be carried over up to a maximum of 5 days.

2. Expense Reports
Expense reports must be submitted within 30 days of the purchase.
Receipts are required for any expense above 25 euros.

3. Incident Reporting
Security incidents must be reported to the on-call engineer
immediately via the incident hotline.";

/// Unrelated fixture used to verify scoping and relevance.
pub const RUNBOOK: &str = "\
CLUSTER OPERATIONS
Rotate the kubernetes certificates every ninety days.
Drain nodes before kernel upgrades and uncordon afterwards.";

/// Deterministic embedder: each whitespace token bumps one dimension
/// chosen by its hash, then the vector is L2-normalized. Texts
/// sharing tokens land close in cosine space.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            v[(hasher.finish() as usize) % self.dimension] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedder standing in for an unreachable provider.
pub struct FailingEmbedder {
    pub dimension: usize,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(DocbaseError::EmbeddingUnavailable(
            "connection refused".to_string(),
        ))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(DocbaseError::EmbeddingUnavailable(
            "connection refused".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Store wrapper whose lexical scoring always fails, for exercising
/// semantic-only degradation.
pub struct LexicalFailStore {
    inner: InMemoryChunkStore,
}

impl LexicalFailStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: InMemoryChunkStore::new(dimension),
        }
    }
}

#[async_trait]
impl ChunkStore for LexicalFailStore {
    async fn replace_chunks(
        &self,
        tenant_id: &str,
        document_id: &str,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<()> {
        self.inner.replace_chunks(tenant_id, document_id, chunks).await
    }

    async fn delete_chunks(&self, tenant_id: &str, document_id: &str) -> Result<usize> {
        self.inner.delete_chunks(tenant_id, document_id).await
    }

    async fn top_k_by_vector(
        &self,
        tenant_id: &str,
        query_vector: &[f32],
        k: usize,
        document_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        self.inner
            .top_k_by_vector(tenant_id, query_vector, k, document_filter)
            .await
    }

    async fn lexical_score(
        &self,
        _tenant_id: &str,
        _document_filter: Option<&str>,
        _query_text: &str,
        _candidate_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, f32>> {
        Err(DocbaseError::LexicalScoringUnavailable(
            "text-search backend offline".to_string(),
        ))
    }
}

/// Config tuned for the mock embedder's dimension.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.embedding.dimension = TEST_DIM;
    config
}

/// Services over the mock embedder and the in-memory store.
pub fn mock_services() -> Services {
    init_tracing();
    Services::with_components(
        test_config(),
        Arc::new(MockEmbedder::new(TEST_DIM)),
        Arc::new(InMemoryChunkStore::new(TEST_DIM)),
    )
    .expect("test config must validate")
}

/// Services whose store cannot score lexically.
pub fn degraded_services() -> Services {
    init_tracing();
    Services::with_components(
        test_config(),
        Arc::new(MockEmbedder::new(TEST_DIM)),
        Arc::new(LexicalFailStore::new(TEST_DIM)),
    )
    .expect("test config must validate")
}

/// Services whose embedding provider is down.
pub fn failing_embedder_services() -> Services {
    init_tracing();
    Services::with_components(
        test_config(),
        Arc::new(FailingEmbedder { dimension: TEST_DIM }),
        Arc::new(InMemoryChunkStore::new(TEST_DIM)),
    )
    .expect("test config must validate")
}
