//! Plain-text rendering of search results.
//!
//! The answer is the retrieved fragments themselves, numbered, with page,
//! file name, relevance and a bounded text preview. No text is generated.

use std::fmt::Write;

use konspekt_core::models::SearchResult;

pub const NO_RESULTS: &str = "No information found for your question.";

/// Render `results` as a readable answer to `question`.
pub fn format_answer(question: &str, results: &[SearchResult], preview_chars: usize) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    let rule = "=".repeat(60);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Question: {}", question);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);
    let _ = writeln!(out, "Found the following information:");

    for (i, r) in results.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "--- Source {} (page {}, {}) ---",
            i + 1,
            r.fragment.page,
            r.fragment.source
        );
        let _ = writeln!(out, "Relevance: {:.3}", r.relevance_score);
        let _ = writeln!(out, "Text: {}", preview(&r.fragment.text, preview_chars));
        let _ = writeln!(out, "{}", "-".repeat(40));
    }
    out
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}
