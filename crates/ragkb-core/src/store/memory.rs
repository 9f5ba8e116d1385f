//! In-memory [`DocumentStore`] implementation for testing and ephemeral use.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Search is the same
//! brute-force ranking the SQLite backend uses. Batch writes validate the
//! whole batch before touching the map, then insert under a single write
//! guard, so readers never observe half a batch.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Document, SearchResult, SourceSummary};
use crate::search::rank_documents;

use super::{validate_document, DocumentStore};

#[derive(Default)]
struct State {
    docs: HashMap<String, Document>,
    closed: bool,
}

/// In-memory store. Contents are lost when it is dropped.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
        if guard.closed {
            return Err(Error::Closed);
        }
        Ok(guard)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        let guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        if guard.closed {
            return Err(Error::Closed);
        }
        Ok(guard)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn initialize(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    async fn add_document(&self, doc: &Document) -> Result<()> {
        validate_document(doc)?;
        self.write()?.docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn add_documents(&self, docs: &[Document]) -> Result<()> {
        for doc in docs {
            validate_document(doc)?;
        }
        let mut state = self.write()?;
        for doc in docs {
            state.docs.insert(doc.id.clone(), doc.clone());
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: i64) -> Result<Vec<SearchResult>> {
        let state = self.read()?;
        Ok(rank_documents(query, state.docs.values().cloned(), limit))
    }

    async fn get_document(&self, id: &str) -> Result<Document> {
        self.read()?
            .docs
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id))
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.write()?
            .docs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(id))
    }

    async fn list_by_source(&self, source: &str) -> Result<Vec<Document>> {
        Ok(self
            .read()?
            .docs
            .values()
            .filter(|d| d.source == source)
            .cloned()
            .collect())
    }

    async fn delete_source(&self, source: &str) -> Result<u64> {
        let mut state = self.write()?;
        let before = state.docs.len();
        state.docs.retain(|_, d| d.source != source);
        Ok((before - state.docs.len()) as u64)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.docs.len() as u64)
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let state = self.read()?;
        let mut by_source: BTreeMap<&str, SourceSummary> = BTreeMap::new();
        for doc in state.docs.values() {
            by_source
                .entry(doc.source.as_str())
                .and_modify(|s| {
                    s.chunks += 1;
                    s.last_ingested = s.last_ingested.max(doc.created_at);
                })
                .or_insert_with(|| SourceSummary {
                    source: doc.source.clone(),
                    chunks: 1,
                    last_ingested: doc.created_at,
                });
        }
        Ok(by_source.into_values().collect())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.write()?;
        state.docs.clear();
        state.closed = true;
        Ok(())
    }
}
