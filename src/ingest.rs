//! `konspekt ingest`: add documents to the index.
//!
//! Each argument is a document or a directory. Directories contribute their
//! supported documents (non-recursive, sorted by name). Documents are
//! ingested in order; the first failure stops the command, leaving whatever
//! was already committed in the index.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use konspekt_core::models::IngestReport;

use crate::config::Config;
use crate::engine::{build_engine, AppEngine};
use crate::extract::{Format, SUPPORTED_EXTENSIONS};

/// Expand directories into the supported documents they contain.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && Format::from_path(p).is_some())
                .collect();
            found.sort();
            if found.is_empty() {
                tracing::warn!(dir = %path.display(), "no supported documents in directory");
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

pub fn format_report(report: &IngestReport) -> String {
    format!(
        "Ingested {}: {} page{}, {} fragment{} added (index now holds {})",
        report.source,
        report.pages,
        if report.pages == 1 { "" } else { "s" },
        report.fragments_added,
        if report.fragments_added == 1 { "" } else { "s" },
        report.index_size
    )
}

/// Ingest one document into an existing engine and describe the outcome.
pub fn ingest_one(engine: &mut AppEngine, path: &Path) -> Result<IngestReport> {
    let report = engine.ingest(path)?;
    if report.fragments_added == 0 {
        tracing::warn!(source = %report.source, "document contained no extractable text");
    }
    Ok(report)
}

/// Run the ingest command.
pub fn run_ingest(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let files = collect_inputs(paths)?;
    if files.is_empty() {
        bail!(
            "No documents to ingest (supported: {})",
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    let mut engine = build_engine(config)?;
    for file in &files {
        let report = ingest_one(&mut engine, file)?;
        println!("{}", format_report(&report));
    }
    Ok(())
}
