//! Service container wiring the engine together.
//!
//! `Services` owns the shared components: embedder, chunk store,
//! indexer, and retriever, all built from one validated `Config`.
//! Consumers hold the container and call into `indexer` and
//! `retriever`; tests inject their own embedder and store through
//! `with_components`.

use std::sync::Arc;
use std::time::Duration;

use crate::core::chunker::Chunker;
use crate::core::config::Config;
use crate::core::embedding::{Embedder, OllamaEmbedder};
use crate::core::error::Result;
use crate::core::indexer::Indexer;
use crate::core::retriever::HybridRetriever;
use crate::core::store::{ChunkStore, InMemoryChunkStore};

/// Shared engine components.
pub struct Services {
    pub config: Config,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn ChunkStore>,
    pub indexer: Arc<Indexer>,
    pub retriever: Arc<HybridRetriever>,
}

impl Services {
    /// Build the default wiring: an Ollama embedding client and the
    /// in-memory chunk store.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
            config.embedding.base_url.clone(),
            config.embedding.model.clone(),
            config.embedding.dimension,
            Duration::from_secs(config.embedding.timeout_secs),
        )?);
        let store: Arc<dyn ChunkStore> =
            Arc::new(InMemoryChunkStore::new(config.embedding.dimension));
        Self::with_components(config, embedder, store)
    }

    /// Build the container around injected components.
    pub fn with_components(
        config: Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn ChunkStore>,
    ) -> Result<Self> {
        config.validate()?;

        let mut chunker = Chunker::new(config.chunking.target_size, config.chunking.overlap)
            .with_min_size(config.chunking.min_size);
        if let Some(max_size) = config.chunking.max_size {
            chunker = chunker.with_max_size(max_size);
        }
        let indexer = Arc::new(Indexer::new(embedder.clone(), store.clone(), chunker));
        let retriever = Arc::new(HybridRetriever::new(
            embedder.clone(),
            store.clone(),
            config.retrieval.clone(),
        ));

        Ok(Self {
            config,
            embedder,
            store,
            indexer,
            retriever,
        })
    }
}
