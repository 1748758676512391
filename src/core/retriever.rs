//! Hybrid retrieval.
//!
//! Answers a query in two stages: a vector pre-filter pulls the K
//! most semantically similar chunks for the tenant, then lexical
//! relevance re-scores that bounded candidate set. The final ranking
//! combines both signals with configured weights.
//!
//! A relevance floor guards downstream answer generation: when even
//! the best candidate's raw cosine similarity is below the floor,
//! the search reports `InsufficientRelevance` instead of returning
//! weakly related chunks. "Nothing indexed in scope" is the separate
//! `NoCandidates` outcome. Normalization to [0, 1] happens after the
//! floor check, for score combination only.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::core::config::RetrievalConfig;
use crate::core::embedding::Embedder;
use crate::core::error::{DocbaseError, Result};
use crate::core::store::ChunkStore;
use crate::core::types::{SearchHit, SearchOutcome, SearchResults};

/// Map raw cosine similarity from [-1, 1] into [0, 1].
pub fn normalize_semantic(similarity: f32) -> f32 {
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Weighted combination of normalized component scores.
///
/// Both inputs must already be normalized to [0, 1]; with weights
/// summing to 1 the result is in [0, 1] too.
pub fn combined_score(semantic: f32, lexical: f32, semantic_weight: f32, lexical_weight: f32) -> f32 {
    semantic_weight * semantic + lexical_weight * lexical
}

/// Two-stage hybrid search over an embedder and a chunk store.
pub struct HybridRetriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ChunkStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Candidate pool size for a given result count: at least the
    /// configured pool, and at least 4x the requested hits so the
    /// re-ranker has room to reorder.
    fn candidate_k(&self, top_n: usize) -> usize {
        self.config.candidate_pool.max(4 * top_n)
    }

    /// Run a hybrid search for one tenant.
    ///
    /// `top_n` falls back to the configured default;
    /// `document_filter` restricts the search to a single document.
    #[instrument(skip(self, query_text), fields(query_len = query_text.len()))]
    pub async fn search(
        &self,
        tenant_id: &str,
        query_text: &str,
        top_n: Option<usize>,
        document_filter: Option<&str>,
    ) -> Result<SearchOutcome> {
        let query = query_text.trim();
        if query.is_empty() {
            return Err(DocbaseError::InvalidQuery(
                "query text must not be empty".to_string(),
            ));
        }
        let top_n = top_n.unwrap_or(self.config.top_n);
        if top_n == 0 {
            return Err(DocbaseError::InvalidQuery(
                "top_n must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();

        let query_vector = self.embedder.embed(query).await?;
        let candidates = self
            .store
            .top_k_by_vector(
                tenant_id,
                &query_vector,
                self.candidate_k(top_n),
                document_filter,
            )
            .await?;

        if candidates.is_empty() {
            info!(tenant_id, "no candidates in scope");
            return Ok(SearchOutcome::NoCandidates);
        }

        // The floor applies to raw cosine similarity; normalization
        // is for score combination only.
        let best_similarity = candidates
            .iter()
            .map(|c| c.similarity)
            .fold(f32::MIN, f32::max);

        if best_similarity < self.config.relevance_floor {
            info!(
                tenant_id,
                best_similarity,
                floor = self.config.relevance_floor,
                "best candidate below relevance floor"
            );
            return Ok(SearchOutcome::InsufficientRelevance {
                best_semantic: best_similarity,
            });
        }

        let semantic: Vec<f32> = candidates
            .iter()
            .map(|c| normalize_semantic(c.similarity))
            .collect();

        // Lexical re-scoring over the candidate set only. Failure is
        // non-fatal: ranking degrades to semantic-only.
        let candidate_ids: Vec<Uuid> = candidates.iter().map(|c| c.chunk.id).collect();
        let (lexical_raw, lexical_degraded) = match self
            .store
            .lexical_score(tenant_id, document_filter, query, &candidate_ids)
            .await
        {
            Ok(scores) => (scores, false),
            Err(e) => {
                warn!(tenant_id, error = %e, "lexical scoring failed, falling back to semantic-only");
                (Default::default(), true)
            }
        };

        // Normalize lexical scores against the candidate-set maximum.
        let lexical_max = lexical_raw.values().cloned().fold(0.0f32, f32::max);

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .zip(semantic)
            .map(|(candidate, semantic_score)| {
                let lexical_score = if lexical_degraded || lexical_max <= 0.0 {
                    0.0
                } else {
                    lexical_raw.get(&candidate.chunk.id).copied().unwrap_or(0.0) / lexical_max
                };
                let combined = if lexical_degraded {
                    semantic_score
                } else {
                    combined_score(
                        semantic_score,
                        lexical_score,
                        self.config.semantic_weight,
                        self.config.lexical_weight,
                    )
                };
                SearchHit {
                    chunk: candidate.chunk,
                    combined_score: combined,
                    semantic_score,
                    lexical_score,
                }
            })
            .collect();

        // Combined descending; ties broken by semantic score, then
        // by document position, so rankings are reproducible.
        hits.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.semantic_score
                        .partial_cmp(&a.semantic_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.chunk.document_id.cmp(&b.chunk.document_id))
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        hits.truncate(top_n);

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            tenant_id,
            hits = hits.len(),
            best_similarity,
            lexical_degraded,
            duration_ms,
            "search ranked"
        );

        Ok(SearchOutcome::Ranked(SearchResults {
            hits,
            lexical_degraded,
            duration_ms,
        }))
    }
}
