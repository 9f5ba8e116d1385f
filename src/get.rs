//! Single-document commands: `kb get` and `kb delete`.

use anyhow::{Context, Result};

use ragkb_core::models::Document;
use ragkb_core::store::DocumentStore;

use crate::config::Config;
use crate::db;

/// Printable view of a stored chunk; the embedding is summarized by its
/// dimensionality.
#[derive(Debug, Clone)]
pub struct DocumentView {
    pub id: String,
    pub source: String,
    pub chunk_index: Option<usize>,
    pub created_at: String, // RFC 3339
    pub dims: usize,
    pub metadata: serde_json::Value,
    pub content: String,
}

impl From<&Document> for DocumentView {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            source: doc.source.clone(),
            chunk_index: doc.chunk_index(),
            created_at: doc.created_at.to_rfc3339(),
            dims: doc.embedding.len(),
            metadata: serde_json::to_value(&doc.metadata).unwrap_or(serde_json::json!({})),
            content: doc.content.clone(),
        }
    }
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = store.get_document(id).await;
    store.close().await?;

    let doc = result.with_context(|| format!("Failed to get document {}", id))?;
    let view = DocumentView::from(&doc);

    println!("--- {} ---", view.id);
    println!("source:     {}", view.source);
    if let Some(index) = view.chunk_index {
        println!("chunk:      {}", index);
    }
    println!("created_at: {}", view.created_at);
    println!("dims:       {}", view.dims);
    println!("metadata:   {}", view.metadata);
    println!();
    println!("{}", view.content);

    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = db::open_store(config).await?;
    let result = store.delete_document(id).await;
    store.close().await?;

    result.with_context(|| format!("Failed to delete document {}", id))?;
    println!("Deleted {}", id);
    Ok(())
}
