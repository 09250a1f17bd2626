//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait defines everything the [`RetrievalEngine`]
//! needs from storage: incremental add, nearest-neighbour search, clear, and
//! persistence. The core ships [`InMemoryIndex`](memory::InMemoryIndex); the
//! app crate wraps it in a directory-backed index.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`dims`](VectorIndex::dims) | Established dimensionality, if any |
//! | [`add`](VectorIndex::add) | Append fragments with their vectors, all or nothing |
//! | [`search`](VectorIndex::search) | Top-k by cosine similarity |
//! | [`size`](VectorIndex::size) | Number of stored vectors |
//! | [`clear`](VectorIndex::clear) | Remove everything and reset dimensionality |
//! | [`persist`](VectorIndex::persist) | Flush to durable storage |
//!
//! [`RetrievalEngine`]: crate::engine::RetrievalEngine

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Fragment, IndexedVector, SearchResult};

/// Storage for embedded fragments.
///
/// Dimensionality is fixed by the first vector ever added and stays fixed
/// until [`clear`](VectorIndex::clear). Search ranks by raw cosine
/// similarity, descending, with ties broken by insertion order.
pub trait VectorIndex: Send {
    /// Dimensionality of stored vectors, or `None` while empty.
    fn dims(&self) -> Option<usize>;

    /// Number of stored vectors.
    fn size(&self) -> usize;

    /// Append `fragments[i]` with `vectors[i]` for every `i`.
    ///
    /// Either every pair is stored or none is. Returns the number added.
    /// Duplicates are appended, not merged.
    fn add(&mut self, fragments: Vec<Fragment>, vectors: Vec<Vec<f32>>) -> Result<usize>;

    /// Up to `k` results ordered by descending relevance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Stored entries in insertion order.
    fn entries(&self) -> &[IndexedVector];

    /// Remove every entry. Idempotent.
    fn clear(&mut self) -> Result<()>;

    /// Write current state to durable storage, if the index has any.
    fn persist(&mut self) -> Result<()>;
}

/// Serializable state of an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub dims: Option<usize>,
    pub entries: Vec<IndexedVector>,
}
