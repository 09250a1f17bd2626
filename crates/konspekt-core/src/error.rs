//! Error taxonomy for the retrieval pipeline.
//!
//! Every stage of ingest and query fails with a [`RetrievalError`]; nothing
//! inside the core swallows a failure. Presentation layers use
//! [`RetrievalError::code`] to pick a short user-facing message or an HTTP
//! status without string matching.

use thiserror::Error;

/// Typed failure of a retrieval-pipeline operation.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The document path does not exist, cannot be read, or cannot be parsed.
    #[error("cannot read source {path}: {reason}")]
    SourceUnreadable { path: String, reason: String },

    /// A configuration value violates a contract (e.g. overlap ≥ chunk size, k = 0).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The embedding model could not be loaded or invoked.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A vector's length differs from the index's established dimensionality.
    #[error("dimension mismatch: index holds {expected}-dim vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Fragment and vector counts passed to `add` differ.
    #[error("length mismatch: {fragments} fragments but {vectors} vectors")]
    LengthMismatch { fragments: usize, vectors: usize },

    /// Persisting or loading the index failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl RetrievalError {
    /// Builds a [`RetrievalError::SourceUnreadable`] from any displayable reason.
    pub fn unreadable(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        RetrievalError::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            RetrievalError::SourceUnreadable { .. } => "source_unreadable",
            RetrievalError::InvalidConfig(_) => "invalid_config",
            RetrievalError::EmbeddingUnavailable(_) => "embedding_unavailable",
            RetrievalError::DimensionMismatch { .. } => "dimension_mismatch",
            RetrievalError::LengthMismatch { .. } => "length_mismatch",
            RetrievalError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
