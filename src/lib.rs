//! docbase: document indexing and hybrid retrieval engine.
//!
//! Turns extracted document text into searchable, tenant-isolated
//! chunks and answers queries by combining vector similarity with
//! lexical relevance under a relevance floor.
//!
//! # Example
//!
//! ```no_run
//! use docbase::{Config, Services};
//!
//! # async fn run() -> docbase::Result<()> {
//! let services = Services::new(Config::load()?)?;
//!
//! let report = services
//!     .indexer
//!     .index_document("acme", "handbook", "1. Leave Policy\nEmployees get 25 days.")
//!     .await;
//! assert!(report.success);
//!
//! let outcome = services
//!     .retriever
//!     .search("acme", "how many days of leave do I get?", None, None)
//!     .await?;
//! for hit in outcome.hits() {
//!     println!("{:.2} {}", hit.combined_score, hit.chunk.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use core::chunker::Chunker;
pub use core::config::{ChunkingConfig, Config, EmbeddingConfig, RetrievalConfig};
pub use core::embedding::{Embedder, OllamaEmbedder};
pub use core::error::{DocbaseError, Result};
pub use core::indexer::Indexer;
pub use core::retriever::HybridRetriever;
pub use core::services::Services;
pub use core::store::{ChunkStore, InMemoryChunkStore};
pub use core::types::{
    Chunk, EmbeddedChunk, IndexReport, IndexState, ScoredChunk, SearchHit, SearchOutcome,
    SearchResults,
};
