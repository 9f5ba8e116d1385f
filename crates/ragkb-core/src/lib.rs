//! # ragkb core
//!
//! Shared, WASM-safe logic for ragkb: the document model, boundary-aware
//! chunking, cosine-similarity ranking, the [`DocumentStore`](store::DocumentStore)
//! and [`Embedder`](embedding::Embedder) traits, and an in-memory store.
//!
//! This crate contains no tokio runtime, sqlx, filesystem I/O, or HTTP
//! dependencies. Native collaborators (SQLite store, HTTP embedding clients,
//! the file-ingesting retriever) live in the `ragkb` application crate.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod search;
pub mod store;

pub use error::{Error, Result};
