//! In-memory chunk store.
//!
//! Reference implementation of `ChunkStore`: a `RwLock`-guarded map
//! keyed by `(tenant_id, document_id)`. A replace swaps the whole
//! entry under the write lock, so readers see either the old chunk
//! set or the new one, never a mix.
//!
//! Lexical scoring approximates weighted text-search ranking with
//! term coverage times term frequency over a per-chunk term index
//! built at write time.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{DocbaseError, Result};
use crate::core::store::ChunkStore;
use crate::core::types::{EmbeddedChunk, ScoredChunk};

/// A stored chunk with its write-time term index.
#[derive(Debug, Clone)]
struct StoredChunk {
    embedded: EmbeddedChunk,
    /// Lowercased term -> occurrence count
    term_counts: HashMap<String, usize>,
    /// Total terms in the chunk text
    term_total: usize,
}

impl StoredChunk {
    fn new(embedded: EmbeddedChunk) -> Self {
        let terms = tokenize(&embedded.chunk.text);
        let term_total = terms.len();
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        for term in terms {
            *term_counts.entry(term).or_insert(0) += 1;
        }
        Self {
            embedded,
            term_counts,
            term_total,
        }
    }
}

/// In-memory `ChunkStore` implementation.
pub struct InMemoryChunkStore {
    dimension: usize,
    documents: RwLock<HashMap<(String, String), Vec<StoredChunk>>>,
}

impl InMemoryChunkStore {
    /// Create a store that accepts vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// The vector dimension this store accepts.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of chunks stored for a tenant, across documents.
    pub async fn chunk_count(&self, tenant_id: &str) -> usize {
        self.documents
            .read()
            .await
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id)
            .map(|(_, chunks)| chunks.len())
            .sum()
    }

    /// Validate a chunk batch before it becomes visible.
    fn validate_batch(
        &self,
        tenant_id: &str,
        document_id: &str,
        chunks: &[EmbeddedChunk],
    ) -> Result<()> {
        let mut seen_ordinals = HashSet::new();
        for chunk in chunks {
            if chunk.chunk.tenant_id != tenant_id || chunk.chunk.document_id != document_id {
                return Err(DocbaseError::TenantMismatch(format!(
                    "chunk {} belongs to {}/{}, batch targets {}/{}",
                    chunk.chunk.id,
                    chunk.chunk.tenant_id,
                    chunk.chunk.document_id,
                    tenant_id,
                    document_id
                )));
            }
            if chunk.vector.len() != self.dimension {
                return Err(DocbaseError::StoreWriteFailure(format!(
                    "chunk {} has vector dimension {}, store expects {}",
                    chunk.chunk.id,
                    chunk.vector.len(),
                    self.dimension
                )));
            }
            if !seen_ordinals.insert(chunk.chunk.ordinal) {
                return Err(DocbaseError::StoreWriteFailure(format!(
                    "duplicate ordinal {} in batch for {}/{}",
                    chunk.chunk.ordinal, tenant_id, document_id
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn replace_chunks(
        &self,
        tenant_id: &str,
        document_id: &str,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<()> {
        // Validate outside the write lock; nothing becomes visible
        // unless the whole batch passes.
        self.validate_batch(tenant_id, document_id, &chunks)?;

        let stored: Vec<StoredChunk> = chunks.into_iter().map(StoredChunk::new).collect();
        let count = stored.len();

        let mut documents = self.documents.write().await;
        documents.insert((tenant_id.to_string(), document_id.to_string()), stored);

        debug!(tenant_id, document_id, count, "chunk set replaced");
        Ok(())
    }

    async fn delete_chunks(&self, tenant_id: &str, document_id: &str) -> Result<usize> {
        let mut documents = self.documents.write().await;
        let removed = documents
            .remove(&(tenant_id.to_string(), document_id.to_string()))
            .map_or(0, |chunks| chunks.len());

        debug!(tenant_id, document_id, removed, "chunks deleted");
        Ok(removed)
    }

    async fn top_k_by_vector(
        &self,
        tenant_id: &str,
        query_vector: &[f32],
        k: usize,
        document_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>> {
        if query_vector.len() != self.dimension {
            return Err(DocbaseError::EmbeddingDimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut scored: Vec<ScoredChunk> = documents
            .iter()
            .filter(|((tenant, document), _)| {
                tenant == tenant_id && document_filter.map_or(true, |f| document == f)
            })
            .flat_map(|(_, chunks)| chunks.iter())
            .map(|stored| ScoredChunk {
                chunk: stored.embedded.chunk.clone(),
                similarity: cosine_similarity(query_vector, &stored.embedded.vector),
            })
            .collect();

        // Descending similarity; stable tie-break on (document,
        // ordinal) keeps results deterministic across runs.
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.document_id.cmp(&b.chunk.document_id))
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn lexical_score(
        &self,
        tenant_id: &str,
        document_filter: Option<&str>,
        query_text: &str,
        candidate_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, f32>> {
        let query_terms: Vec<String> = tokenize(query_text);
        let unique_terms: HashSet<&String> = query_terms.iter().collect();

        let documents = self.documents.read().await;
        let by_id: HashMap<Uuid, &StoredChunk> = documents
            .iter()
            .filter(|((tenant, document), _)| {
                tenant == tenant_id && document_filter.map_or(true, |f| document == f)
            })
            .flat_map(|(_, chunks)| chunks.iter())
            .map(|stored| (stored.embedded.chunk.id, stored))
            .collect();

        let mut scores = HashMap::with_capacity(candidate_ids.len());
        for id in candidate_ids {
            let score = match by_id.get(id) {
                Some(stored) if !unique_terms.is_empty() && stored.term_total > 0 => {
                    let matched: usize = unique_terms
                        .iter()
                        .filter(|t| stored.term_counts.contains_key(t.as_str()))
                        .count();
                    let occurrences: usize = unique_terms
                        .iter()
                        .filter_map(|t| stored.term_counts.get(t.as_str()))
                        .sum();
                    let coverage = matched as f32 / unique_terms.len() as f32;
                    let frequency = occurrences as f32 / stored.term_total as f32;
                    coverage * frequency
                }
                _ => 0.0,
            };
            scores.insert(*id, score);
        }
        Ok(scores)
    }
}

/// Lowercased alphanumeric terms.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Cosine similarity in [-1, 1]; 0 for zero-magnitude vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
