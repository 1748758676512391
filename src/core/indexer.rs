//! Document indexing pipeline.
//!
//! Drives a document through chunk → annotate → embed → store and
//! tracks its index state: `not_indexed` → `indexing` →
//! `indexed` | `failed`, with re-indexing always passing through
//! `indexing` again. Runs for the same `(tenant, document)` are
//! serialized by a per-document async lock; runs for different
//! documents proceed concurrently.
//!
//! Indexing is idempotent: the old chunk set is deleted up front and
//! the new set replaces it, so retrying a failed run converges to the
//! same outcome as a clean first run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::core::chunker::Chunker;
use crate::core::embedding::Embedder;
use crate::core::error::{DocbaseError, Result};
use crate::core::heading::annotate_chunks;
use crate::core::store::ChunkStore;
use crate::core::types::{Chunk, EmbeddedChunk, IndexReport, IndexState};

type DocKey = (String, String);

/// Indexing pipeline over an embedder and a chunk store.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
    chunker: Chunker,
    states: RwLock<HashMap<DocKey, IndexState>>,
    /// Per-document locks serializing concurrent index requests
    locks: Mutex<HashMap<DocKey, Arc<Mutex<()>>>>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn ChunkStore>, chunker: Chunker) -> Self {
        Self {
            embedder,
            store,
            chunker,
            states: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Current index state of a document. Unknown documents are
    /// `not_indexed`.
    pub async fn index_state(&self, tenant_id: &str, document_id: &str) -> IndexState {
        self.states
            .read()
            .await
            .get(&(tenant_id.to_string(), document_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Index (or re-index) a document from its extracted text.
    ///
    /// Never returns an error: failures land in the report and in the
    /// document's `failed` state, where callers and retries can see
    /// them.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn index_document(
        &self,
        tenant_id: &str,
        document_id: &str,
        text: &str,
    ) -> IndexReport {
        let key = (tenant_id.to_string(), document_id.to_string());
        let doc_lock = self.lock_for(&key).await;
        let _guard = doc_lock.lock().await;

        let started = Instant::now();
        self.set_state(&key, IndexState::Indexing).await;

        match self.run_pipeline(tenant_id, document_id, text).await {
            Ok(chunk_count) => {
                self.set_state(&key, IndexState::Indexed).await;
                let duration_ms = started.elapsed().as_millis() as u64;
                info!(tenant_id, document_id, chunk_count, duration_ms, "document indexed");
                IndexReport {
                    success: true,
                    error: None,
                    chunk_count,
                    duration_ms,
                }
            }
            Err(e) => {
                let message = e.message();
                self.set_state(
                    &key,
                    IndexState::Failed {
                        error: message.clone(),
                    },
                )
                .await;
                let duration_ms = started.elapsed().as_millis() as u64;
                warn!(
                    tenant_id,
                    document_id,
                    error = %message,
                    retryable = e.is_retryable(),
                    "indexing failed"
                );
                IndexReport {
                    success: false,
                    error: Some(message),
                    chunk_count: 0,
                    duration_ms,
                }
            }
        }
    }

    /// Remove a document: delete its chunks and forget its state and
    /// lock entry, returning how many chunks were deleted.
    ///
    /// This is also what keeps the per-document bookkeeping maps from
    /// growing forever in long-lived processes. An index run racing
    /// this call simply recreates the entries, starting from
    /// `not_indexed`.
    pub async fn remove_document(&self, tenant_id: &str, document_id: &str) -> Result<usize> {
        let key = (tenant_id.to_string(), document_id.to_string());
        let doc_lock = self.lock_for(&key).await;
        let guard = doc_lock.lock().await;

        let removed = self.store.delete_chunks(tenant_id, document_id).await?;
        self.states.write().await.remove(&key);
        drop(guard);
        self.locks.lock().await.remove(&key);

        info!(tenant_id, document_id, removed, "document removed");
        Ok(removed)
    }

    async fn run_pipeline(&self, tenant_id: &str, document_id: &str, text: &str) -> Result<usize> {
        // Empty input fails before the old chunks are touched, so a
        // previously indexed version stays searchable.
        if text.trim().is_empty() {
            return Err(DocbaseError::ContentMissing(format!(
                "document {document_id} has no extractable text"
            )));
        }

        // From here the old chunk set is gone; a failure below leaves
        // the document with zero chunks and a `failed` state, which a
        // retry repairs.
        self.store.delete_chunks(tenant_id, document_id).await?;

        let pieces = self.chunker.chunk(text);
        if pieces.is_empty() {
            return Err(DocbaseError::ContentMissing(format!(
                "document {document_id} produced no content to index"
            )));
        }

        let spans = annotate_chunks(text, &pieces);
        let chunks: Vec<Chunk> = pieces
            .iter()
            .zip(spans.iter())
            .enumerate()
            .map(|(ordinal, (piece, span))| {
                Chunk::new(tenant_id, document_id, ordinal, piece.clone()).with_span(
                    span.char_start,
                    span.char_end,
                    span.heading.clone(),
                )
            })
            .collect();

        let vectors = self.embedder.embed_batch(&pieces).await?;

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect();
        let count = embedded.len();

        self.store
            .replace_chunks(tenant_id, document_id, embedded)
            .await?;
        Ok(count)
    }

    async fn set_state(&self, key: &DocKey, next: IndexState) {
        let mut states = self.states.write().await;
        let current = states.get(key).cloned().unwrap_or_default();
        debug_assert!(
            current.can_transition_to(&next),
            "illegal index state transition {} -> {}",
            current.as_str(),
            next.as_str()
        );
        states.insert(key.clone(), next);
    }

    async fn lock_for(&self, key: &DocKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
