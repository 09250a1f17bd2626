//! # Konspekt
//!
//! Question answering over study notes, fully local.
//!
//! Konspekt splits documents into overlapping fragments, embeds them, keeps
//! them in an on-disk vector index, and answers a question with the most
//! relevant fragments and their citations. The storage- and model-agnostic
//! pipeline lives in `konspekt-core`; this crate supplies file extraction,
//! the embedding model, durable storage, and the CLI and HTTP front ends.
//!
//! ## Architecture
//!
//! ```text
//! document ──▶ FileNormalizer ──▶ RetrievalEngine ──▶ DiskIndex (./konspekt_db)
//!                                       ▲
//!                    ┌──────────────────┼──────────────────┐
//!                    │                  │                  │
//!               CLI commands        chat loop          HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Page-aware text extraction |
//! | [`embedding`] | Embedder construction, fastembed model |
//! | [`store`] | Directory-backed vector index |
//! | [`engine`] | Engine wiring |
//! | [`answer`] | Answer formatting |
//! | [`ingest`], [`search`], [`stats`], [`clear`], [`chat`] | CLI commands |
//! | [`server`] | HTTP API |

pub mod answer;
pub mod chat;
pub mod clear;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod ingest;
pub mod search;
pub mod server;
pub mod stats;
pub mod store;
