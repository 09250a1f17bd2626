//! Core data models that flow through the retrieval pipeline.
//!
//! [`SourceDocument`] and [`Page`] exist only during ingest; [`Fragment`] is
//! transient until embedded; [`IndexedVector`] is owned by a
//! [`VectorIndex`](crate::index::VectorIndex); [`SearchResult`] is produced
//! per query and never stored.

use serde::{Deserialize, Serialize};

/// One logical page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number in document order.
    pub index: u32,
    pub text: String,
}

/// A document after text extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name the document was read from (e.g. `"lecture-3.pdf"`).
    pub identifier: String,
    pub pages: Vec<Page>,
}

impl SourceDocument {
    pub fn new(identifier: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            identifier: identifier.into(),
            pages,
        }
    }
}

/// A bounded span of page text: the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    /// Page number inherited from the originating [`Page`].
    pub page: u32,
    /// Document identifier inherited from the originating [`SourceDocument`].
    pub source: String,
    /// 0-based position within the page's fragment list.
    pub sequence_index: usize,
}

/// A fragment together with its embedding, as held by an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    /// UUID assigned when the fragment is added. Stable across persist/load.
    pub fragment_id: String,
    /// SHA-256 of the fragment text; equal hashes mean duplicate content.
    pub hash: String,
    pub vector: Vec<f32>,
    pub fragment: Fragment,
}

/// A ranked fragment returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub fragment_id: String,
    pub fragment: Fragment,
    /// Cosine similarity in `[-1.0, 1.0]`; higher is more relevant.
    pub relevance_score: f32,
}

/// Outcome of a successful [`RetrievalEngine::ingest`](crate::engine::RetrievalEngine::ingest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub pages: usize,
    /// Fragments committed to the index by this call.
    pub fragments_added: usize,
    /// Index size after the call.
    pub index_size: usize,
}
