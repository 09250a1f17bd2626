//! Embedder construction and the fastembed-backed local model.
//!
//! - **`LocalEmbedder`** runs an ONNX sentence-embedding model locally via
//!   fastembed. The model is downloaded from Hugging Face on first use and
//!   cached; after that, embedding runs entirely offline.
//! - **[`HashEmbedder`]** (from `konspekt-core`) needs no model files at all.
//!
//! Use [`create_embedder`] to build the one named in the configuration.
//!
//! ```rust
//! # use konspekt::config::EmbeddingConfig;
//! # use konspekt::embedding::create_embedder;
//! let config = EmbeddingConfig {
//!     provider: "hash".to_string(),
//!     dims: Some(64),
//!     ..EmbeddingConfig::default()
//! };
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.dims(), 64);
//! ```

use anyhow::{bail, Result};

use konspekt_core::embedding::{Embedder, HashEmbedder};

use crate::config::EmbeddingConfig;

/// Model identifiers accepted by the local provider, with their dimensionality.
pub const LOCAL_MODELS: &[(&str, usize)] = &[
    ("all-minilm-l6-v2", 384),
    ("bge-small-en-v1.5", 384),
    ("bge-base-en-v1.5", 768),
    ("bge-large-en-v1.5", 1024),
    ("nomic-embed-text-v1", 768),
    ("nomic-embed-text-v1.5", 768),
    ("multilingual-e5-small", 384),
    ("multilingual-e5-base", 768),
    ("multilingual-e5-large", 1024),
];

/// Dimensionality of a supported local model.
pub fn resolve_local_model(name: &str) -> Result<usize> {
    match LOCAL_MODELS.iter().find(|(n, _)| *n == name) {
        Some((_, dims)) => Ok(*dims),
        None => bail!(
            "Unknown local embedding model: '{}'. Supported models: {}",
            name,
            LOCAL_MODELS
                .iter()
                .map(|(n, _)| *n)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// | Config Value | Embedder |
/// |-------------|----------|
/// | `"local"` | `LocalEmbedder` (needs the `local-embeddings` feature) |
/// | `"hash"` | [`HashEmbedder`] with `config.dims` (default 256) |
///
/// Building a `LocalEmbedder` does not load the model.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Box::new(local::LocalEmbedder::new(config)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!(
            "Local embedding provider requires --features local-embeddings; set embedding.provider = \"hash\" to run without a model"
        ),
        "hash" => Ok(Box::new(HashEmbedder::new(config.hash_dims())?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use std::sync::Mutex;

    use konspekt_core::embedding::Embedder;
    use konspekt_core::{Result, RetrievalError};

    use crate::config::EmbeddingConfig;

    /// Sentence-embedding model run in-process by fastembed.
    ///
    /// The ONNX session is created on the first `embed_batch` call, so
    /// commands that never embed (stats, clear, queries on an empty index)
    /// never download or load the model.
    pub struct LocalEmbedder {
        model_name: String,
        dims: usize,
        batch_size: usize,
        fastembed_model: fastembed::EmbeddingModel,
        model: Mutex<Option<fastembed::TextEmbedding>>,
    }

    impl LocalEmbedder {
        pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
            let dims = super::resolve_local_model(&config.model)?;
            let fastembed_model = config_to_fastembed_model(&config.model)?;
            Ok(Self {
                model_name: config.model.clone(),
                dims,
                batch_size: config.batch_size,
                fastembed_model,
                model: Mutex::new(None),
            })
        }
    }

    fn config_to_fastembed_model(name: &str) -> anyhow::Result<fastembed::EmbeddingModel> {
        match name {
            "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
            "nomic-embed-text-v1" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV1),
            "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
            "multilingual-e5-small" => Ok(fastembed::EmbeddingModel::MultilingualE5Small),
            "multilingual-e5-base" => Ok(fastembed::EmbeddingModel::MultilingualE5Base),
            "multilingual-e5-large" => Ok(fastembed::EmbeddingModel::MultilingualE5Large),
            other => anyhow::bail!("Unknown local embedding model: '{}'", other),
        }
    }

    impl Embedder for LocalEmbedder {
        fn model_name(&self) -> &str {
            &self.model_name
        }

        fn dims(&self) -> usize {
            self.dims
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let mut guard = self
                .model
                .lock()
                .map_err(|_| RetrievalError::EmbeddingUnavailable("model lock poisoned".into()))?;

            if guard.is_none() {
                tracing::info!(model = %self.model_name, "loading local embedding model");
                let model = fastembed::TextEmbedding::try_new(
                    fastembed::InitOptions::new(self.fastembed_model.clone())
                        .with_show_download_progress(true),
                )
                .map_err(|e| {
                    RetrievalError::EmbeddingUnavailable(format!(
                        "Failed to initialize local embedding model: {}",
                        e
                    ))
                })?;
                *guard = Some(model);
            }
            let Some(model) = guard.as_mut() else {
                return Err(RetrievalError::EmbeddingUnavailable("model not loaded".into()));
            };

            model
                .embed(texts.to_vec(), Some(self.batch_size))
                .map_err(|e| RetrievalError::EmbeddingUnavailable(format!("Local embedding failed: {}", e)))
        }
    }
}
