//! Index statistics.
//!
//! A quick summary of what's indexed: fragment counts, duplicate content,
//! dimensionality, model, and a per-source breakdown. Used by
//! `konspekt stats`, the chat `:stats` command and `GET /stats`.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::Result;
use serde::Serialize;

use konspekt_core::index::VectorIndex;

use crate::config::Config;
use crate::engine::open_index;
use crate::store::DiskIndex;

/// Per-source breakdown of page and fragment counts.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub source: String,
    pub pages: usize,
    pub fragments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub index_dir: String,
    pub size_bytes: u64,
    pub fragments: usize,
    /// Fragments with distinct text.
    pub distinct_fragments: usize,
    pub dims: Option<usize>,
    pub model: Option<String>,
    pub updated_at: Option<i64>,
    pub sources: Vec<SourceStats>,
}

pub fn collect_stats(index: &DiskIndex) -> IndexStats {
    let entries = index.entries();
    let distinct: HashSet<&str> = entries.iter().map(|e| e.hash.as_str()).collect();

    let mut by_source: BTreeMap<&str, (BTreeSet<u32>, usize)> = BTreeMap::new();
    for e in entries {
        let slot = by_source.entry(e.fragment.source.as_str()).or_default();
        slot.0.insert(e.fragment.page);
        slot.1 += 1;
    }
    let mut sources: Vec<SourceStats> = by_source
        .into_iter()
        .map(|(source, (pages, fragments))| SourceStats {
            source: source.to_string(),
            pages: pages.len(),
            fragments,
        })
        .collect();
    sources.sort_by(|a, b| b.fragments.cmp(&a.fragments).then_with(|| a.source.cmp(&b.source)));

    IndexStats {
        index_dir: index.dir().display().to_string(),
        size_bytes: index.disk_usage(),
        fragments: entries.len(),
        distinct_fragments: distinct.len(),
        dims: index.dims(),
        model: index.model().map(str::to_string),
        updated_at: index.updated_at(),
        sources,
    }
}

/// Run the stats command: load the index and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let index = open_index(config)?;
    print!("{}", render_stats(&collect_stats(&index)));
    Ok(())
}

pub fn render_stats(stats: &IndexStats) -> String {
    let mut out = String::new();
    out.push_str("Konspekt — Index Stats\n");
    out.push_str("======================\n\n");
    out.push_str(&format!("  Index:       {}\n", stats.index_dir));
    out.push_str(&format!("  Size:        {}\n\n", format_bytes(stats.size_bytes)));
    out.push_str(&format!("  Fragments:   {}\n", stats.fragments));
    out.push_str(&format!("  Distinct:    {}\n", stats.distinct_fragments));
    out.push_str(&format!(
        "  Dimensions:  {}\n",
        stats.dims.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    ));
    out.push_str(&format!(
        "  Model:       {}\n",
        stats.model.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "  Updated:     {}\n",
        stats
            .updated_at
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    ));

    if !stats.sources.is_empty() {
        out.push_str("\n  By source:\n");
        out.push_str(&format!("  {:<40} {:>6} {:>10}\n", "SOURCE", "PAGES", "FRAGMENTS"));
        out.push_str(&format!("  {}\n", "-".repeat(58)));
        for s in &stats.sources {
            out.push_str(&format!("  {:<40} {:>6} {:>10}\n", s.source, s.pages, s.fragments));
        }
    }
    out.push('\n');
    out
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use konspekt_core::models::Fragment;

    #[test]
    fn bytes_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn relative_time() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
    }

    #[test]
    fn counts_sources_pages_and_duplicates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut index = DiskIndex::open(tmp.path().join("db")).unwrap();
        let frag = |text: &str, page: u32, source: &str| Fragment {
            text: text.to_string(),
            page,
            source: source.to_string(),
            sequence_index: 0,
        };
        index
            .add(
                vec![
                    frag("a", 1, "bio.pdf"),
                    frag("b", 2, "bio.pdf"),
                    frag("a", 2, "bio.pdf"),
                    frag("c", 1, "chem.txt"),
                ],
                vec![vec![1.0]; 4],
            )
            .unwrap();

        let stats = collect_stats(&index);
        assert_eq!(stats.fragments, 4);
        assert_eq!(stats.distinct_fragments, 3);
        assert_eq!(stats.dims, Some(1));
        assert_eq!(stats.sources.len(), 2);
        assert_eq!(stats.sources[0].source, "bio.pdf");
        assert_eq!(stats.sources[0].pages, 2);
        assert_eq!(stats.sources[0].fragments, 3);

        let text = render_stats(&stats);
        assert!(text.contains("Fragments:   4"));
        assert!(text.contains("chem.txt"));
        assert!(text.contains("Updated:     never"));
    }
}
