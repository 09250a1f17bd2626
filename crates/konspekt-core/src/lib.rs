//! # Konspekt Core
//!
//! Storage- and model-agnostic retrieval pipeline for Konspekt: data models,
//! typed errors, the recursive overlapping chunker, the [`Embedder`] and
//! [`VectorIndex`] traits, an in-memory index, and the [`RetrievalEngine`]
//! that ties them together.
//!
//! This crate does no filesystem or network I/O of its own. Text extraction,
//! model loading, and durable storage are supplied by the application through
//! the [`TextNormalizer`], [`Embedder`], and [`VectorIndex`] traits.
//!
//! ```text
//! document ─▶ TextNormalizer ─▶ chunk::split ─▶ Embedder ─▶ VectorIndex::add
//! question ─▶ Embedder ─▶ VectorIndex::search ─▶ Vec<SearchResult>
//! ```
//!
//! [`Embedder`]: embedding::Embedder
//! [`VectorIndex`]: index::VectorIndex
//! [`RetrievalEngine`]: engine::RetrievalEngine
//! [`TextNormalizer`]: normalize::TextNormalizer

pub mod chunk;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod models;
pub mod normalize;

pub use error::{Result, RetrievalError};
