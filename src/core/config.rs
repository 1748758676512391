//! Configuration management for the docbase engine.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{DocbaseError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Chunking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Target characters per chunk (not bytes!)
    #[serde(default = "default_target_size")]
    pub target_size: usize,

    /// Character overlap between consecutive chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Minimum chunk length; only a document's final chunk may fall
    /// below it
    #[serde(default = "default_min_size")]
    pub min_size: usize,

    /// Hard upper bound on chunk length; unbounded when unset
    /// (chunks then tolerate target_size plus overlap)
    #[serde(default)]
    pub max_size: Option<usize>,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Base URL of the Ollama-compatible provider
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Expected vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds (covers whole-batch requests)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Retrieval configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Default number of hits to return
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Minimum vector pre-filter candidate pool
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// Weight of the normalized semantic score
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Weight of the normalized lexical score
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Raw cosine similarity the best candidate must reach for any
    /// hits to be returned
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f32,
}

// Default value functions
fn default_target_size() -> usize {
    1000
}

fn default_overlap() -> usize {
    150
}

fn default_min_size() -> usize {
    1
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_top_n() -> usize {
    5
}

fn default_candidate_pool() -> usize {
    20
}

fn default_semantic_weight() -> f32 {
    0.7
}

fn default_lexical_weight() -> f32 {
    0.3
}

fn default_relevance_floor() -> f32 {
    0.3
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            overlap: default_overlap(),
            min_size: default_min_size(),
            max_size: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            candidate_pool: default_candidate_pool(),
            semantic_weight: default_semantic_weight(),
            lexical_weight: default_lexical_weight(),
            relevance_floor: default_relevance_floor(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DocbaseError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// Priority order:
    /// 1. DOCBASE_CONFIG env var pointing at a TOML file
    /// 2. ./docbase.toml
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("DOCBASE_CONFIG") {
            Self::from_file(config_path)?
        } else if Path::new("docbase.toml").exists() {
            Self::from_file("docbase.toml")?
        } else {
            Self::default()
        };

        // Override with environment variables
        config.merge_env();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        // Chunking configuration
        if let Ok(target_size) = env::var("DOCBASE_TARGET_SIZE") {
            if let Ok(size) = target_size.parse() {
                self.chunking.target_size = size;
            }
        }
        if let Ok(overlap) = env::var("DOCBASE_OVERLAP") {
            if let Ok(o) = overlap.parse() {
                self.chunking.overlap = o;
            }
        }

        // Embedding configuration
        if let Ok(base_url) = env::var("DOCBASE_EMBED_BASE_URL") {
            self.embedding.base_url = base_url;
        }
        if let Ok(model) = env::var("DOCBASE_EMBED_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(dimension) = env::var("DOCBASE_EMBED_DIMENSION") {
            if let Ok(d) = dimension.parse() {
                self.embedding.dimension = d;
            }
        }
        if let Ok(timeout) = env::var("DOCBASE_EMBED_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.embedding.timeout_secs = t;
            }
        }

        // Retrieval configuration
        if let Ok(top_n) = env::var("DOCBASE_TOP_N") {
            if let Ok(n) = top_n.parse() {
                self.retrieval.top_n = n;
            }
        }
        if let Ok(pool) = env::var("DOCBASE_CANDIDATE_POOL") {
            if let Ok(p) = pool.parse() {
                self.retrieval.candidate_pool = p;
            }
        }
        if let Ok(floor) = env::var("DOCBASE_RELEVANCE_FLOOR") {
            if let Ok(f) = floor.parse() {
                self.retrieval.relevance_floor = f;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate chunking config
        if self.chunking.target_size == 0 {
            return Err(DocbaseError::ConfigError(
                "Target size must be non-zero".to_string(),
            ));
        }

        if self.chunking.overlap >= self.chunking.target_size {
            return Err(DocbaseError::ConfigError(
                "Overlap must be less than target size".to_string(),
            ));
        }

        if self.chunking.min_size > self.chunking.target_size {
            return Err(DocbaseError::ConfigError(
                "Min size cannot exceed target size".to_string(),
            ));
        }

        if let Some(max_size) = self.chunking.max_size {
            if max_size < self.chunking.target_size {
                return Err(DocbaseError::ConfigError(
                    "Max size cannot be smaller than target size".to_string(),
                ));
            }
        }

        // Validate embedding config
        if self.embedding.base_url.is_empty() {
            return Err(DocbaseError::ConfigError(
                "Embedding base URL must be set".to_string(),
            ));
        }

        if self.embedding.model.is_empty() {
            return Err(DocbaseError::ConfigError(
                "Embedding model must be set".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(DocbaseError::ConfigError(
                "Embedding dimension must be non-zero".to_string(),
            ));
        }

        if self.embedding.timeout_secs == 0 {
            return Err(DocbaseError::ConfigError(
                "Embedding timeout must be non-zero".to_string(),
            ));
        }

        // Validate retrieval config
        if self.retrieval.top_n == 0 {
            return Err(DocbaseError::ConfigError(
                "Top n must be non-zero".to_string(),
            ));
        }

        if self.retrieval.candidate_pool < self.retrieval.top_n {
            return Err(DocbaseError::ConfigError(
                "Candidate pool cannot be smaller than top n".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.semantic_weight)
            || !(0.0..=1.0).contains(&self.retrieval.lexical_weight)
        {
            return Err(DocbaseError::ConfigError(
                "Score weights must be within [0, 1]".to_string(),
            ));
        }

        let weight_sum = self.retrieval.semantic_weight + self.retrieval.lexical_weight;
        if (weight_sum - 1.0).abs() > 1e-3 {
            return Err(DocbaseError::ConfigError(
                "Score weights must sum to 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.relevance_floor) {
            return Err(DocbaseError::ConfigError(
                "Relevance floor must be within [0, 1]".to_string(),
            ));
        }

        Ok(())
    }

    /// Log configuration (redacting nothing; no secrets live here)
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Target chunk size: {} chars", self.chunking.target_size);
        tracing::info!("  Overlap: {} chars", self.chunking.overlap);
        tracing::info!("  Embedding provider: {}", self.embedding.base_url);
        tracing::info!("  Embedding model: {}", self.embedding.model);
        tracing::info!("  Embedding dimension: {}", self.embedding.dimension);
        tracing::info!("  Embedding timeout: {}s", self.embedding.timeout_secs);
        tracing::info!("  Top n: {}", self.retrieval.top_n);
        tracing::info!("  Candidate pool: {}", self.retrieval.candidate_pool);
        tracing::info!(
            "  Score weights: {} semantic / {} lexical",
            self.retrieval.semantic_weight,
            self.retrieval.lexical_weight
        );
        tracing::info!("  Relevance floor: {}", self.retrieval.relevance_floor);
    }
}
