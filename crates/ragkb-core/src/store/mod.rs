//! Storage abstraction for the knowledge base.
//!
//! The [`DocumentStore`] trait is the only durable state in the system:
//! chunk records keyed by id, with similarity search over their
//! embeddings. Backends are injected into the retriever, so an embedded
//! SQLite store and the [`memory::InMemoryStore`] test double satisfy the
//! same contract.
//!
//! # Concurrency
//!
//! Stores are `Send + Sync` but not internally synchronized across
//! callers beyond what the backing engine enforces. Batch writes are
//! atomic; upserts are last-writer-wins with no optimistic-concurrency
//! check. Treat a store as single-writer.

pub mod memory;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Document, SearchResult, SourceSummary};

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`initialize`](DocumentStore::initialize) | Idempotently create schema |
/// | [`add_document`](DocumentStore::add_document) | Upsert one document by id |
/// | [`add_documents`](DocumentStore::add_documents) | Upsert a batch, all or nothing |
/// | [`search`](DocumentStore::search) | Full-scan cosine similarity ranking |
/// | [`get_document`](DocumentStore::get_document) | Fetch by id (`NotFound` if absent) |
/// | [`delete_document`](DocumentStore::delete_document) | Delete by id (`NotFound` if absent) |
/// | [`list_by_source`](DocumentStore::list_by_source) | All chunks of one source, unordered |
/// | [`delete_source`](DocumentStore::delete_source) | Atomically delete all chunks of one source |
/// | [`count`](DocumentStore::count) | Corpus size |
/// | [`list_sources`](DocumentStore::list_sources) | Per-source audit summary |
/// | [`close`](DocumentStore::close) | Release resources; later calls fail with `Closed` |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ensure schema and indexes exist. Safe to call repeatedly.
    async fn initialize(&self) -> Result<()>;

    /// Insert or replace a document by id.
    async fn add_document(&self, doc: &Document) -> Result<()>;

    /// Insert or replace a batch of documents atomically: on any failure
    /// none of them are written.
    async fn add_documents(&self, docs: &[Document]) -> Result<()>;

    /// Rank every stored document against `query` and return the top
    /// `limit` (all of them when `limit <= 0`). See [`crate::search`] for
    /// the ordering.
    async fn search(&self, query: &[f32], limit: i64) -> Result<Vec<SearchResult>>;

    async fn get_document(&self, id: &str) -> Result<Document>;

    async fn delete_document(&self, id: &str) -> Result<()>;

    async fn list_by_source(&self, source: &str) -> Result<Vec<Document>>;

    /// Delete every document of `source` in one atomic step and return how
    /// many were removed. Zero matches is not an error.
    async fn delete_source(&self, source: &str) -> Result<u64>;

    async fn count(&self) -> Result<u64>;

    /// One summary per distinct source, ordered by source.
    async fn list_sources(&self) -> Result<Vec<SourceSummary>>;

    async fn close(&self) -> Result<()>;
}

/// Check a document before it is written.
///
/// Rejects an empty id, content that is empty after trimming, and any
/// non-finite embedding component.
pub fn validate_document(doc: &Document) -> Result<()> {
    let reason = if doc.id.is_empty() {
        Some("id is empty".to_string())
    } else if doc.content.trim().is_empty() {
        Some("content is empty".to_string())
    } else {
        doc.embedding
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| format!("embedding component {} is not finite", i))
    };

    match reason {
        Some(reason) => Err(Error::InvalidDocument {
            id: doc.id.clone(),
            reason,
        }),
        None => Ok(()),
    }
}
