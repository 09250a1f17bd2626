//! Text extraction seam.
//!
//! The core never opens files itself. An application supplies a
//! [`TextNormalizer`] that turns a path into page-tagged text; the engine
//! feeds the result to the chunker.

use std::path::Path;

use crate::error::Result;
use crate::models::SourceDocument;

/// Extracts page-tagged plain text from a document on disk.
///
/// Implementations return one [`Page`](crate::models::Page) per logical page,
/// numbered from 1 in document order, and fail with
/// [`RetrievalError::SourceUnreadable`](crate::RetrievalError::SourceUnreadable)
/// when the path is missing or the format cannot be parsed.
pub trait TextNormalizer: Send + Sync {
    fn extract(&self, path: &Path) -> Result<SourceDocument>;
}
