//! Page-aware text extraction for study documents (PDF, text, OOXML).
//!
//! [`FileNormalizer`] is the app's [`TextNormalizer`]: it picks a format from
//! the file extension, extracts one string per logical page, and wraps the
//! result in a [`SourceDocument`] named after the file.
//!
//! | Extension | Pages |
//! |-----------|-------|
//! | `.pdf` | one per PDF page |
//! | `.txt` `.md` `.markdown` `.text` | split on form feed (`\x0c`) |
//! | `.docx` | whole document as one page |
//! | `.pptx` | one per slide |

use std::io::Read;
use std::path::Path;

use konspekt_core::models::{Page, SourceDocument};
use konspekt_core::normalize::TextNormalizer;
use konspekt_core::{Result, RetrievalError};

/// Extensions [`FileNormalizer`] accepts, lower-case, without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "markdown", "text", "docx", "pptx"];

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Text,
    Docx,
    Pptx,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Format::Pdf),
            "txt" | "md" | "markdown" | "text" => Some(Format::Text),
            "docx" => Some(Format::Docx),
            "pptx" => Some(Format::Pptx),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported file type (expected one of: {})", SUPPORTED_EXTENSIONS.join(", "))]
    UnsupportedFormat,
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

/// Reads documents from disk.
#[derive(Debug, Default, Clone)]
pub struct FileNormalizer;

impl FileNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl TextNormalizer for FileNormalizer {
    fn extract(&self, path: &Path) -> Result<SourceDocument> {
        let shown = path.display().to_string();
        let format = Format::from_path(path)
            .ok_or_else(|| RetrievalError::unreadable(&shown, ExtractError::UnsupportedFormat))?;
        let bytes = std::fs::read(path).map_err(|e| RetrievalError::unreadable(&shown, e))?;
        let texts = extract_pages(&bytes, format).map_err(|e| RetrievalError::unreadable(&shown, e))?;

        let identifier = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(shown);
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page {
                index: i as u32 + 1,
                text,
            })
            .collect();
        Ok(SourceDocument::new(identifier, pages))
    }
}

/// One extracted string per logical page, in document order.
pub fn extract_pages(bytes: &[u8], format: Format) -> std::result::Result<Vec<String>, ExtractError> {
    match format {
        Format::Pdf => extract_pdf(bytes),
        Format::Text => Ok(extract_plain(bytes)),
        Format::Docx => extract_docx(bytes).map(|t| vec![t]),
        Format::Pptx => extract_pptx(bytes),
    }
}

fn extract_plain(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    text.split('\x0c').map(str::to_string).collect()
}

fn extract_pdf(bytes: &[u8]) -> std::result::Result<Vec<String>, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(ExtractError::Pdf("document has no pages".to_string()));
    }
    Ok(pages
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = number, error = %e, "could not decode PDF page; treating it as empty");
                String::new()
            }
        })
        .collect())
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> std::result::Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn open_zip(bytes: &[u8]) -> std::result::Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> std::result::Result<String, ExtractError> {
    let mut archive = open_zip(bytes)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    extract_runs(&xml)
}

fn extract_pptx(bytes: &[u8]) -> std::result::Result<Vec<String>, ExtractError> {
    let mut archive = open_zip(bytes)?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    if slide_names.is_empty() {
        return Err(ExtractError::Ooxml("presentation has no slides".to_string()));
    }
    slide_names
        .iter()
        .map(|name| {
            let xml = read_zip_entry_bounded(&mut archive, name, MAX_XML_ENTRY_BYTES)?;
            extract_runs(&xml)
        })
        .collect()
}

/// Concatenate `<*:t>` runs, with a newline after each `<*:p>` paragraph.
///
/// Works for both WordprocessingML (`w:`) and DrawingML (`a:`) text.
fn extract_runs(xml: &[u8]) -> std::result::Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_t = true,
            Ok(Event::Text(te)) if in_t => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
