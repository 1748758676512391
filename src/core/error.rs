//! Error types and error handling for the docbase engine.
//!
//! This module defines the error taxonomy used throughout the
//! crate. Transport-specific error mapping (HTTP status codes,
//! API error payloads) belongs to the consuming service, not here.

use thiserror::Error;

/// Result type alias for docbase operations
pub type Result<T> = std::result::Result<T, DocbaseError>;

/// Main error type for the docbase engine
#[derive(Error, Debug)]
pub enum DocbaseError {
    /// No text to chunk; terminal for the index attempt until the
    /// document content changes.
    #[error("Document has no content to index: {0}")]
    ContentMissing(String),

    /// Transient embedding provider failure (network, timeout, 5xx).
    /// Retryable by re-invoking the index or search operation.
    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The provider returned a vector of the wrong dimension. This
    /// signals model/config drift and is never retried.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    /// Persistence layer failure during replace/delete. Re-indexing
    /// is idempotent, so the caller may retry.
    #[error("Store write failed: {0}")]
    StoreWriteFailure(String),

    /// Lexical scoring failed during search. Non-fatal: the retriever
    /// falls back to semantic-only ranking.
    #[error("Lexical scoring unavailable: {0}")]
    LexicalScoringUnavailable(String),

    /// A chunk batch referenced a tenant or document it does not
    /// belong to. Always a caller bug.
    #[error("Tenant mismatch: {0}")]
    TenantMismatch(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DocbaseError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if the operation may succeed when retried as-is
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DocbaseError::EmbeddingUnavailable(_) | DocbaseError::StoreWriteFailure(_)
        )
    }

    /// Check if this is a configuration-drift error requiring
    /// operator intervention
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            DocbaseError::EmbeddingDimensionMismatch { .. } | DocbaseError::ConfigError(_)
        )
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            DocbaseError::InvalidQuery(_)
                | DocbaseError::TenantMismatch(_)
                | DocbaseError::ContentMissing(_)
        )
    }
}
