//! Retrieval engine: ingest documents and answer similarity queries.
//!
//! [`RetrievalEngine`] wires a [`TextNormalizer`], the chunker, an
//! [`Embedder`] and a [`VectorIndex`] together.
//!
//! # Ingest
//!
//! ```text
//! path ─▶ normalizer.extract ─▶ chunk::split ─▶ for each batch:
//!                                                 embed_batch ─▶ index.add ─▶ index.persist
//! ```
//!
//! The first failure aborts the ingest. Batches committed before it stay in
//! the index, and on disk for a durable index.
//!
//! # Query
//!
//! A blank question or an empty index returns no results without touching
//! the embedder, so an unloaded model is never loaded just to find nothing.

use std::path::Path;

use crate::chunk::{self, ChunkConfig};
use crate::embedding::Embedder;
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;
use crate::models::{IngestReport, SearchResult};
use crate::normalize::TextNormalizer;

/// Tunables for a [`RetrievalEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub chunking: ChunkConfig,
    /// Fragments embedded and committed per step.
    pub batch_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            chunking: ChunkConfig::default(),
            batch_size: 64,
        }
    }
}

pub struct RetrievalEngine<I: VectorIndex> {
    normalizer: Box<dyn TextNormalizer>,
    embedder: Box<dyn Embedder>,
    index: I,
    options: EngineOptions,
}

impl<I: VectorIndex> RetrievalEngine<I> {
    /// Build an engine, checking the options and that a non-empty `index`
    /// holds vectors of the embedder's dimensionality.
    pub fn new(
        normalizer: Box<dyn TextNormalizer>,
        embedder: Box<dyn Embedder>,
        index: I,
        options: EngineOptions,
    ) -> Result<Self> {
        options.chunking.validate()?;
        if options.batch_size == 0 {
            return Err(RetrievalError::InvalidConfig(
                "batch_size must be >= 1".into(),
            ));
        }
        if let Some(dims) = index.dims() {
            if dims != embedder.dims() {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dims,
                    actual: embedder.dims(),
                });
            }
        }
        Ok(Self {
            normalizer,
            embedder,
            index,
            options,
        })
    }

    /// Extract, chunk, embed and index one document.
    pub fn ingest(&mut self, path: &Path) -> Result<IngestReport> {
        let document = self.normalizer.extract(path)?;
        let fragments = chunk::split(&document, &self.options.chunking)?;
        tracing::info!(
            source = %document.identifier,
            pages = document.pages.len(),
            fragments = fragments.len(),
            "ingesting document"
        );

        let mut added = 0;
        for (n, batch) in fragments.chunks(self.options.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|f| f.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            added += self.index.add(batch.to_vec(), vectors)?;
            self.index.persist()?;
            tracing::debug!(batch = n, size = batch.len(), total = added, "batch committed");
        }

        Ok(IngestReport {
            source: document.identifier,
            pages: document.pages.len(),
            fragments_added: added,
            index_size: self.index.size(),
        })
    }

    /// Up to `k` fragments most similar to `question`, best first.
    pub fn query(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RetrievalError::InvalidConfig("k must be >= 1".into()));
        }
        if question.trim().is_empty() || self.index.size() == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(question)?;
        self.index.search(&vector, k)
    }

    /// Remove every indexed fragment.
    pub fn clear(&mut self) -> Result<()> {
        self.index.clear()
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}
