//! In-memory [`VectorIndex`] with brute-force cosine search.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::error::{Result, RetrievalError};
use crate::models::{Fragment, IndexedVector, SearchResult};

use super::{IndexSnapshot, VectorIndex};

/// Vectors held in a `Vec` in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    dims: Option<usize>,
    entries: Vec<IndexedVector>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from a snapshot, checking that every vector has the
    /// recorded dimensionality.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self> {
        let IndexSnapshot { dims, entries } = snapshot;
        match dims {
            None if !entries.is_empty() => {
                return Err(RetrievalError::StorageUnavailable(format!(
                    "snapshot has {} entries but no dimensionality",
                    entries.len()
                )));
            }
            Some(0) => {
                return Err(RetrievalError::StorageUnavailable(
                    "snapshot records zero dimensionality".into(),
                ));
            }
            Some(d) => {
                if let Some(bad) = entries.iter().find(|e| e.vector.len() != d) {
                    return Err(RetrievalError::StorageUnavailable(format!(
                        "entry {} has {} dims, expected {}",
                        bad.fragment_id,
                        bad.vector.len(),
                        d
                    )));
                }
            }
            None => {}
        }
        // An empty snapshot does not pin a dimensionality.
        let dims = if entries.is_empty() { None } else { dims };
        Ok(Self { dims, entries })
    }

    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            dims: self.dims,
            entries: self.entries.clone(),
        }
    }
}

impl VectorIndex for InMemoryIndex {
    fn dims(&self) -> Option<usize> {
        self.dims
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn add(&mut self, fragments: Vec<Fragment>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        if fragments.len() != vectors.len() {
            return Err(RetrievalError::LengthMismatch {
                fragments: fragments.len(),
                vectors: vectors.len(),
            });
        }
        let Some(first) = vectors.first() else {
            return Ok(0);
        };

        let expected = self.dims.unwrap_or(first.len());
        if expected == 0 {
            return Err(RetrievalError::InvalidConfig(
                "cannot index zero-length vectors".into(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let added = fragments.len();
        self.entries.reserve(added);
        for (fragment, vector) in fragments.into_iter().zip(vectors) {
            self.entries.push(IndexedVector {
                fragment_id: Uuid::new_v4().to_string(),
                hash: format!("{:x}", Sha256::digest(fragment.text.as_bytes())),
                vector,
                fragment,
            });
        }
        self.dims = Some(expected);
        Ok(added)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RetrievalError::InvalidConfig("k must be >= 1".into()));
        }
        let Some(dims) = self.dims else {
            return Ok(Vec::new());
        };
        if query.len() != dims {
            return Err(RetrievalError::DimensionMismatch {
                expected: dims,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector)))
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let e = &self.entries[i];
                SearchResult {
                    fragment_id: e.fragment_id.clone(),
                    fragment: e.fragment.clone(),
                    relevance_score: score,
                }
            })
            .collect())
    }

    fn entries(&self) -> &[IndexedVector] {
        &self.entries
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.dims = None;
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        Ok(())
    }
}
