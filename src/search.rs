//! `konspekt ask`: retrieve the fragments most relevant to a question.

use anyhow::Result;
use serde::Serialize;

use konspekt_core::models::SearchResult;
use konspekt_core::RetrievalError;

use crate::answer::format_answer;
use crate::config::Config;
use crate::engine::{build_engine, AppEngine};

/// Ranked results plus the rendered answer. Also the `POST /query` body.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub results: Vec<SearchResult>,
    pub answer: String,
}

/// Query `engine`, falling back to `retrieval.k` when `k` is not given.
pub fn answer_question(
    engine: &AppEngine,
    config: &Config,
    question: &str,
    k: Option<usize>,
) -> std::result::Result<QueryResponse, RetrievalError> {
    let k = k.unwrap_or(config.retrieval.k);
    let results = engine.query(question, k)?;
    tracing::info!(k, results = results.len(), "query answered");
    let answer = format_answer(question, &results, config.retrieval.preview_chars);
    Ok(QueryResponse {
        question: question.to_string(),
        results,
        answer,
    })
}

/// Run the ask command and print the answer (or JSON with `--json`).
pub fn run_ask(config: &Config, question: &str, k: Option<usize>, json: bool) -> Result<()> {
    let engine = build_engine(config)?;
    let response = answer_question(&engine, config, question, k)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.answer);
    }
    Ok(())
}
