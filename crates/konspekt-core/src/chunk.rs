//! Recursive, separator-aware text chunker with exact overlap.
//!
//! Splits each page of a [`SourceDocument`] into [`Fragment`]s no longer than
//! `chunk_size` characters, where consecutive fragments of a page share
//! exactly `chunk_overlap` characters.
//!
//! # Algorithm
//!
//! 1. **Pieces.** Find the first separator in the ordered list that occurs in
//!    the text and split on it, keeping the separator attached to the piece
//!    before it (pieces concatenate back to the page text byte for byte).
//!    Any piece still longer than `chunk_size` is split again with the
//!    remaining separators. The empty separator, or running out of
//!    separators, forces a hard cut every `chunk_size` characters.
//! 2. **Windows.** Piece ends are the preferred cut points. A window starting
//!    at `s` ends at the furthest piece end `e` with
//!    `s + chunk_overlap < e <= s + chunk_size`, or at `s + chunk_size` when
//!    no piece end qualifies. The next window starts at `e - chunk_overlap`.
//! 3. The last window runs to the end of the page and may be shorter.
//!
//! Lengths are counted in `char`s. Fragments are never trimmed, so the
//! overlap between neighbours is always exact.
//!
//! # Example
//!
//! ```rust
//! use konspekt_core::chunk::{split, ChunkConfig};
//! use konspekt_core::models::{Page, SourceDocument};
//!
//! let doc = SourceDocument::new(
//!     "notes.txt",
//!     vec![Page { index: 1, text: "x".repeat(1200) }],
//! );
//! let fragments = split(&doc, &ChunkConfig::default()).unwrap();
//! let lens: Vec<usize> = fragments.iter().map(|f| f.text.len()).collect();
//! assert_eq!(lens, vec![500, 500, 300]);
//! ```

use serde::Deserialize;

use crate::error::{Result, RetrievalError};
use crate::models::{Fragment, SourceDocument};

/// Paragraph break, line break, sentence terminators, comma, space, hard cut.
pub const DEFAULT_SEPARATORS: [&str; 8] = ["\n\n", "\n", ".", "!", "?", ",", " ", ""];

/// Chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum fragment length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive fragments of a page.
    pub chunk_overlap: usize,
    /// Split preferences, coarsest first.
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    /// Checks `chunk_size > 0` and `chunk_overlap < chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RetrievalError::InvalidConfig(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RetrievalError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split every page of `document` into overlapping fragments.
///
/// Pages are processed independently and in order. Empty or whitespace-only
/// pages produce no fragments. Each fragment inherits its page number and
/// the document identifier; `sequence_index` restarts at 0 on every page.
///
/// # Errors
///
/// [`RetrievalError::InvalidConfig`] if `config` fails [`ChunkConfig::validate`].
pub fn split(document: &SourceDocument, config: &ChunkConfig) -> Result<Vec<Fragment>> {
    config.validate()?;

    let mut fragments = Vec::new();
    for page in &document.pages {
        if page.text.trim().is_empty() {
            continue;
        }
        let windows = split_text(&page.text, config);
        tracing::trace!(page = page.index, fragments = windows.len(), "page chunked");
        for (sequence_index, text) in windows.into_iter().enumerate() {
            fragments.push(Fragment {
                text,
                page: page.index,
                source: document.identifier.clone(),
                sequence_index,
            });
        }
    }
    Ok(fragments)
}

/// Split a single text into overlapping windows.
///
/// `config` must already be valid; [`split`] checks it.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    // Byte offset of every char, plus the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;
    if len == 0 {
        return Vec::new();
    }

    let separators: Vec<&str> = config.separators.iter().map(String::as_str).collect();
    let mut byte_cuts = Vec::new();
    split_pieces(text, 0, &separators, config.chunk_size, &mut byte_cuts);
    let cuts: Vec<usize> = byte_cuts
        .into_iter()
        .filter_map(|b| offsets.binary_search(&b).ok())
        .collect();

    let size = config.chunk_size;
    let overlap = config.chunk_overlap;
    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        let limit = (start + size).min(len);
        let end = if limit == len {
            len
        } else {
            let below = cuts.partition_point(|&c| c <= limit);
            match below.checked_sub(1).map(|i| cuts[i]) {
                Some(cut) if cut > start + overlap => cut,
                _ => limit,
            }
        };
        windows.push(text[offsets[start]..offsets[end]].to_string());
        if end == len {
            break;
        }
        start = end - overlap;
    }
    windows
}

/// Record the end (absolute byte offset) of every piece of `piece`.
fn split_pieces(
    piece: &str,
    base: usize,
    separators: &[&str],
    chunk_size: usize,
    cuts: &mut Vec<usize>,
) {
    if piece.chars().count() <= chunk_size {
        cuts.push(base + piece.len());
        return;
    }

    let found = separators
        .iter()
        .position(|sep| sep.is_empty() || piece.contains(sep));
    let Some(i) = found.filter(|&i| !separators[i].is_empty()) else {
        hard_cut(piece, base, chunk_size, cuts);
        return;
    };

    let sep = separators[i];
    let rest = &separators[i + 1..];
    let mut start = 0;
    for (pos, _) in piece.match_indices(sep) {
        let end = pos + sep.len();
        split_pieces(&piece[start..end], base + start, rest, chunk_size, cuts);
        start = end;
    }
    if start < piece.len() {
        split_pieces(&piece[start..], base + start, rest, chunk_size, cuts);
    }
}

fn hard_cut(piece: &str, base: usize, chunk_size: usize, cuts: &mut Vec<usize>) {
    for (n, (i, _)) in piece.char_indices().enumerate() {
        if n > 0 && n % chunk_size == 0 {
            cuts.push(base + i);
        }
    }
    cuts.push(base + piece.len());
}
