//! Directory-backed [`VectorIndex`].
//!
//! [`DiskIndex`] keeps the whole index in an [`InMemoryIndex`] and mirrors it
//! to a single directory on every [`persist`](VectorIndex::persist):
//!
//! ```text
//! konspekt_db/
//! ├── manifest.json     format_version, dims, count, model, updated_at
//! ├── fragments.jsonl   one fragment record per line, insertion order
//! └── vectors.bin       count × dims little-endian f32
//! ```
//!
//! The manifest is the commit point. A persist first appends the entries
//! added since the last persist to both data files, then atomically replaces
//! the manifest. The data files may therefore hold more than `count` entries
//! after an interrupted persist; `open` reads the first `count` and the next
//! persist rewrites both files from memory. Deleting the directory deletes
//! the index.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use konspekt_core::embedding::{blob_to_vec, vec_to_blob};
use konspekt_core::index::memory::InMemoryIndex;
use konspekt_core::index::{IndexSnapshot, VectorIndex};
use konspekt_core::models::{Fragment, IndexedVector, SearchResult};
use konspekt_core::{Result, RetrievalError};

pub const FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const FRAGMENTS_FILE: &str = "fragments.jsonl";
const VECTORS_FILE: &str = "vectors.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub dims: Option<usize>,
    pub count: usize,
    /// Embedding model the vectors were produced with.
    pub model: Option<String>,
    /// Unix timestamp of the last persist.
    pub updated_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct FragmentRecord {
    fragment_id: String,
    hash: String,
    #[serde(flatten)]
    fragment: Fragment,
}

pub struct DiskIndex {
    dir: PathBuf,
    inner: InMemoryIndex,
    model: Option<String>,
    updated_at: Option<i64>,
    /// Entries the data files hold exactly. `None` forces a full rewrite.
    synced: Option<usize>,
}

fn storage_err(context: &str, path: &Path, e: impl std::fmt::Display) -> RetrievalError {
    RetrievalError::StorageUnavailable(format!("{} {}: {}", context, path.display(), e))
}

impl DiskIndex {
    /// Load the index stored in `dir`, or start empty if there is none yet.
    ///
    /// The directory is not created until the first persist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            tracing::debug!(dir = %dir.display(), "no index on disk; starting empty");
            return Ok(Self {
                dir,
                inner: InMemoryIndex::new(),
                model: None,
                updated_at: None,
                synced: None,
            });
        }

        let manifest = read_manifest(&manifest_path)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RetrievalError::StorageUnavailable(format!(
                "unsupported index format version {} in {} (expected {})",
                manifest.format_version,
                manifest_path.display(),
                FORMAT_VERSION
            )));
        }
        let count = manifest.count;
        let dims = manifest.dims.unwrap_or(0);

        let fragments_path = dir.join(FRAGMENTS_FILE);
        let raw = std::fs::read(&fragments_path)
            .map_err(|e| storage_err("failed to read", &fragments_path, e))?;
        // A trailing line without its newline was cut off mid-append.
        let lines: Vec<&[u8]> = raw
            .split_inclusive(|b| *b == b'\n')
            .filter(|line| line.ends_with(b"\n"))
            .collect();

        let vectors_path = dir.join(VECTORS_FILE);
        let blob = std::fs::read(&vectors_path)
            .map_err(|e| storage_err("failed to read", &vectors_path, e))?;
        let vector_bytes = count * dims * 4;

        if lines.len() < count || blob.len() < vector_bytes {
            return Err(RetrievalError::StorageUnavailable(format!(
                "index in {} is incomplete: manifest says {} × {} dims, found {} fragments and {} vector bytes",
                dir.display(),
                count,
                dims,
                lines.len(),
                blob.len()
            )));
        }
        let surplus = raw.len() > lines[..count].iter().map(|l| l.len()).sum::<usize>()
            || blob.len() > vector_bytes;
        if surplus {
            tracing::warn!(
                dir = %dir.display(),
                count,
                "index data extends past the manifest (interrupted write); ignoring the extra entries"
            );
        }

        let vectors = blob_to_vec(&blob[..vector_bytes]);
        let mut entries = Vec::with_capacity(count);
        for (i, line) in lines[..count].iter().enumerate() {
            let record: FragmentRecord = serde_json::from_slice(line)
                .map_err(|e| storage_err("failed to parse", &fragments_path, e))?;
            entries.push(IndexedVector {
                fragment_id: record.fragment_id,
                hash: record.hash,
                vector: vectors[i * dims..(i + 1) * dims].to_vec(),
                fragment: record.fragment,
            });
        }

        let inner = InMemoryIndex::from_snapshot(IndexSnapshot {
            dims: manifest.dims,
            entries,
        })?;
        tracing::info!(dir = %dir.display(), fragments = inner.size(), "index loaded");

        Ok(Self {
            dir,
            inner,
            model: manifest.model,
            updated_at: Some(manifest.updated_at),
            synced: if surplus { None } else { Some(count) },
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Model recorded with the stored vectors.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = Some(model.into());
    }

    /// Unix timestamp of the last persist, if the index was ever written.
    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    /// Total bytes of the index files on disk.
    pub fn disk_usage(&self) -> u64 {
        [MANIFEST_FILE, FRAGMENTS_FILE, VECTORS_FILE]
            .iter()
            .filter_map(|f| std::fs::metadata(self.dir.join(f)).ok())
            .map(|m| m.len())
            .sum()
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.dir.join(name);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| storage_err("failed to create temp file in", &self.dir, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| storage_err("failed to write", &target, e))?;
        tmp.persist(&target)
            .map_err(|e| storage_err("failed to replace", &target, e.error))?;
        Ok(())
    }

    fn append(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.dir.join(name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .map_err(|e| storage_err("failed to open", &target, e))?;
        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| storage_err("failed to append to", &target, e))
    }

    /// Encode `entries` as (vector bytes, fragment lines).
    fn encode(entries: &[IndexedVector]) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut blob = Vec::new();
        let mut lines = Vec::new();
        for e in entries {
            blob.extend_from_slice(&vec_to_blob(&e.vector));
            let record = FragmentRecord {
                fragment_id: e.fragment_id.clone(),
                hash: e.hash.clone(),
                fragment: e.fragment.clone(),
            };
            serde_json::to_writer(&mut lines, &record)
                .map_err(|e| RetrievalError::StorageUnavailable(e.to_string()))?;
            lines.push(b'\n');
        }
        Ok((blob, lines))
    }
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let raw = std::fs::read(path).map_err(|e| storage_err("failed to read", path, e))?;
    serde_json::from_slice(&raw).map_err(|e| storage_err("failed to parse", path, e))
}

impl VectorIndex for DiskIndex {
    fn dims(&self) -> Option<usize> {
        self.inner.dims()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn add(&mut self, fragments: Vec<Fragment>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        self.inner.add(fragments, vectors)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.inner.search(query, k)
    }

    fn entries(&self) -> &[IndexedVector] {
        self.inner.entries()
    }

    fn clear(&mut self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)
                .map_err(|e| storage_err("failed to remove", &self.dir, e))?;
            tracing::info!(dir = %self.dir.display(), "index directory removed");
        }
        self.inner.clear()?;
        self.updated_at = None;
        self.synced = Some(0);
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| storage_err("failed to create", &self.dir, e))?;

        let entries = self.inner.entries();
        let total = entries.len();
        // Until this persist completes the data files are in an unknown state.
        match self.synced.take() {
            Some(synced) if synced <= total => {
                let (blob, lines) = Self::encode(&entries[synced..])?;
                self.append(VECTORS_FILE, &blob)?;
                self.append(FRAGMENTS_FILE, &lines)?;
            }
            _ => {
                let (blob, lines) = Self::encode(entries)?;
                self.write_atomic(VECTORS_FILE, &blob)?;
                self.write_atomic(FRAGMENTS_FILE, &lines)?;
            }
        }

        let now = chrono::Utc::now().timestamp();
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            dims: self.inner.dims(),
            count: total,
            model: self.model.clone(),
            updated_at: now,
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| RetrievalError::StorageUnavailable(e.to_string()))?;
        self.write_atomic(MANIFEST_FILE, &manifest_json)?;

        self.synced = Some(total);
        self.updated_at = Some(now);
        tracing::debug!(dir = %self.dir.display(), count = total, "index persisted");
        Ok(())
    }
}
