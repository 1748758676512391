//! Core data types for the docbase engine.
//!
//! This module defines the data structures used throughout the
//! crate: chunks, index state, index reports, and search outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rough token estimate used for context budgeting: ~4 characters
/// per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// A single text chunk derived from a document.
///
/// The unit of retrieval. A chunk never spans multiple documents
/// or tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque unique identifier
    pub id: Uuid,

    /// Owning tenant; enforced at every store access
    pub tenant_id: String,

    /// Parent document
    pub document_id: String,

    /// 0-based position within the document, assigned in emission order
    pub ordinal: usize,

    /// The actual text content (never empty or whitespace-only)
    pub text: String,

    /// Character length of `text`
    pub char_len: usize,

    /// Section heading in effect where this chunk starts, if detected
    pub heading: Option<String>,

    /// Character offset where the chunk starts in the source text
    pub char_start: usize,

    /// Character offset where the chunk ends in the source text
    pub char_end: usize,

    /// Rough token estimate (~4 chars per token)
    pub token_estimate: usize,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Chunk {
    /// Create a chunk for the given tenant/document with a fresh id.
    pub fn new(
        tenant_id: impl Into<String>,
        document_id: impl Into<String>,
        ordinal: usize,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        let token_estimate = estimate_tokens(&text);
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            document_id: document_id.into(),
            ordinal,
            text,
            char_len,
            heading: None,
            char_start: 0,
            char_end: 0,
            token_estimate,
            created_at: Utc::now(),
        }
    }

    /// Attach heading and source-offset metadata.
    #[must_use]
    pub fn with_span(mut self, char_start: usize, char_end: usize, heading: Option<String>) -> Self {
        self.char_start = char_start;
        self.char_end = char_end;
        self.heading = heading;
        self
    }
}

/// A chunk paired with its embedding vector, ready for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk with its raw cosine similarity to a query vector, as
/// returned by the vector pre-filter.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Raw cosine similarity in [-1, 1]
    pub similarity: f32,
}

/// Per-document indexing status.
///
/// One canonical snake_case string per variant, shared by serde and
/// `as_str()`, so persistence and in-memory representations never
/// diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexState {
    /// Initial state, nothing indexed yet
    NotIndexed,
    /// An index run is in progress
    Indexing,
    /// Terminal success
    Indexed,
    /// Terminal failure, carries a descriptive error
    Failed { error: String },
}

impl IndexState {
    /// Canonical string form of the variant
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexState::NotIndexed => "not_indexed",
            IndexState::Indexing => "indexing",
            IndexState::Indexed => "indexed",
            IndexState::Failed { .. } => "failed",
        }
    }

    /// Whether a transition to `next` is legal. Every run passes
    /// through `Indexing`; no transition skips it.
    pub fn can_transition_to(&self, next: &IndexState) -> bool {
        match (self, next) {
            // Index triggered (initial run or re-index)
            (IndexState::NotIndexed, IndexState::Indexing)
            | (IndexState::Indexed, IndexState::Indexing)
            | (IndexState::Failed { .. }, IndexState::Indexing) => true,
            // Run completion
            (IndexState::Indexing, IndexState::Indexed)
            | (IndexState::Indexing, IndexState::Failed { .. }) => true,
            _ => false,
        }
    }
}

impl Default for IndexState {
    fn default() -> Self {
        IndexState::NotIndexed
    }
}

/// Result of one document index attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    /// Whether the run reached the `indexed` state
    pub success: bool,

    /// Descriptive error when the run failed
    pub error: Option<String>,

    /// Chunks persisted by this run
    pub chunk_count: usize,

    /// Run duration in milliseconds
    pub duration_ms: u64,
}

/// One ranked hit from a hybrid search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,

    /// Weighted combination of the normalized component scores
    pub combined_score: f32,

    /// Normalized semantic similarity in [0, 1]
    pub semantic_score: f32,

    /// Lexical relevance normalized against the candidate set max
    pub lexical_score: f32,
}

/// Ranked results of a hybrid search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Hits sorted by combined score, descending; length <= top_n
    pub hits: Vec<SearchHit>,

    /// True when lexical scoring failed and ranking fell back to
    /// semantic-only
    pub lexical_degraded: bool,

    /// Query duration in milliseconds
    pub duration_ms: u64,
}

/// Outcome of a hybrid search.
///
/// "Nothing indexed" and "indexed but not relevant enough" are
/// distinct signals; callers must not conflate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The vector pre-filter found no chunks in scope
    NoCandidates,

    /// Candidates exist but the best raw cosine similarity fell
    /// below the relevance floor; downstream answer generation must
    /// not run
    InsufficientRelevance { best_semantic: f32 },

    /// The floor was met; ranked hits follow
    Ranked(SearchResults),
}

impl SearchOutcome {
    /// Ranked hits, if the floor was met
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Ranked(results) => &results.hits,
            _ => &[],
        }
    }

    /// True when the outcome carries ranked hits
    pub fn is_ranked(&self) -> bool {
        matches!(self, SearchOutcome::Ranked(_))
    }
}
