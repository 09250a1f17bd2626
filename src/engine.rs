//! Builds the retrieval engine the commands and the server share.

use anyhow::{Context, Result};

use konspekt_core::engine::{EngineOptions, RetrievalEngine};
use konspekt_core::index::VectorIndex;

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::extract::FileNormalizer;
use crate::store::DiskIndex;

pub type AppEngine = RetrievalEngine<DiskIndex>;

/// Open the configured index without an embedder (for stats and clear).
pub fn open_index(config: &Config) -> Result<DiskIndex> {
    DiskIndex::open(&config.index.dir)
        .with_context(|| format!("Failed to open index at {}", config.index.dir.display()))
}

/// Wire the file normalizer, configured embedder and on-disk index together.
///
/// Fails with [`DimensionMismatch`](konspekt_core::RetrievalError::DimensionMismatch)
/// when the stored vectors were made by a model of different dimensionality.
pub fn build_engine(config: &Config) -> Result<AppEngine> {
    let embedder = create_embedder(&config.embedding)?;
    let mut index = open_index(config)?;

    match index.model() {
        Some(stored) if index.size() > 0 && stored != embedder.model_name() => {
            tracing::warn!(
                stored,
                configured = embedder.model_name(),
                "index was built with a different embedding model; results may be poor"
            );
        }
        Some(_) if index.size() > 0 => {}
        _ => index.set_model(embedder.model_name()),
    }

    let options = EngineOptions {
        chunking: config.chunking.clone(),
        batch_size: config.embedding.batch_size,
    };
    let engine = RetrievalEngine::new(Box::new(FileNormalizer::new()), embedder, index, options)?;
    Ok(engine)
}
