//! Chunk storage.
//!
//! The persistent vector + lexical store is a collaborator behind
//! the `ChunkStore` trait; the engine never talks to a database
//! directly. `InMemoryChunkStore` is the reference implementation of
//! the query semantics; a pgvector- or tantivy-backed store plugs in
//! behind the same trait.
//!
//! Every operation is scoped to a tenant. A store implementation must
//! never let chunks from one tenant influence another tenant's
//! candidates or scores.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::types::{EmbeddedChunk, ScoredChunk};

pub use memory::InMemoryChunkStore;

/// Tenant-scoped chunk persistence and retrieval.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Atomically replace a document's chunk set.
    ///
    /// All-or-nothing: on any validation or write failure the
    /// document's previous visible state is unchanged. Readers never
    /// observe a mix of old and new chunks.
    async fn replace_chunks(
        &self,
        tenant_id: &str,
        document_id: &str,
        chunks: Vec<EmbeddedChunk>,
    ) -> Result<()>;

    /// Delete all chunks for a document, returning how many were
    /// removed. Deleting an unknown document is not an error.
    async fn delete_chunks(&self, tenant_id: &str, document_id: &str) -> Result<usize>;

    /// Top-k chunks by vector similarity, descending, within the
    /// tenant (optionally restricted to one document).
    async fn top_k_by_vector(
        &self,
        tenant_id: &str,
        query_vector: &[f32],
        k: usize,
        document_filter: Option<&str>,
    ) -> Result<Vec<ScoredChunk>>;

    /// Lexical relevance of the query text against each candidate
    /// chunk, keyed by chunk id. Candidates unknown to the store
    /// score 0. Raw scores have no fixed scale; callers normalize.
    async fn lexical_score(
        &self,
        tenant_id: &str,
        document_filter: Option<&str>,
        query_text: &str,
        candidate_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, f32>>;
}
