//! User-facing error messages for the CLI and chat loop.

use konspekt_core::RetrievalError;

/// One short line describing `err`, with a hint where one helps.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<RetrievalError>() {
        Some(e) => describe_retrieval_error(e),
        None => format!("{:#}", err),
    }
}

pub fn describe_retrieval_error(err: &RetrievalError) -> String {
    match err {
        RetrievalError::SourceUnreadable { path, reason } => {
            format!("Could not read {}: {}", path, reason)
        }
        RetrievalError::InvalidConfig(msg) => format!("Invalid configuration: {}", msg),
        RetrievalError::EmbeddingUnavailable(msg) => format!(
            "Embedding model unavailable: {} (set embedding.provider = \"hash\" to work offline)",
            msg
        ),
        RetrievalError::DimensionMismatch { expected, actual } => format!(
            "The index holds {}-dim vectors but the configured model produces {}; run `konspekt clear` and ingest again",
            expected, actual
        ),
        RetrievalError::LengthMismatch { .. } => format!("Internal error: {}", err),
        RetrievalError::StorageUnavailable(msg) => format!("Index storage unavailable: {}", msg),
    }
}
