//! Core data models for the knowledge base.
//!
//! A [`Document`] is one embedded chunk of a source file, the unit of
//! storage and of similarity search. Search hits are returned as
//! [`SearchResult`]s.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata key holding the chunk's position within its source.
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key holding the source file's base name.
pub const META_FILE_NAME: &str = "file_name";

/// Length of the hex document id.
const ID_HEX_LEN: usize = 16;

/// Open-ended string metadata, ordered so its JSON form is deterministic.
pub type Metadata = BTreeMap<String, String>;

/// One stored chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable id derived from `(source, chunk_index)`, see [`document_id`].
    pub id: String,
    /// Chunk text.
    pub content: String,
    /// Absolute path of the origin file.
    pub source: String,
    /// Embedding vector; dimensionality is set by the embedding model.
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    /// Set at write time.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Position of this chunk within its source, if recorded.
    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata
            .get(META_CHUNK_INDEX)
            .and_then(|v| v.parse().ok())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.metadata.get(META_FILE_NAME).map(String::as_str)
    }
}

/// A stored document paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub document: Document,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f64,
}

/// Per-source audit summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    /// Number of stored chunks for this source.
    pub chunks: u64,
    /// Most recent `created_at` among those chunks.
    pub last_ingested: DateTime<Utc>,
}

/// Deterministic document id for chunk `chunk_index` of `source`.
///
/// SHA-256 of `"<source>:<chunk_index>"`, truncated to 16 hex characters.
/// Re-ingesting the same chunk of the same file reproduces the same id,
/// which is what makes ingestion an idempotent upsert.
///
/// ```rust
/// use ragkb_core::models::document_id;
///
/// let id = document_id("/docs/guide.md", 0);
/// assert_eq!(id.len(), 16);
/// assert_eq!(id, document_id("/docs/guide.md", 0));
/// assert_ne!(id, document_id("/docs/guide.md", 1));
/// ```
pub fn document_id(source: &str, chunk_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", source, chunk_index).as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_HEX_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_stable_hex() {
        let id = document_id("/home/user/notes.md", 3);
        assert_eq!(id.len(), ID_HEX_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, document_id("/home/user/notes.md", 3));
    }

    #[test]
    fn test_document_id_distinguishes_source_and_index() {
        let a = document_id("/a.md", 1);
        assert_ne!(a, document_id("/b.md", 1));
        assert_ne!(a, document_id("/a.md", 2));
        assert_ne!(document_id("/a.md", 1), document_id("/a.md", 11));
    }

    #[test]
    fn test_metadata_accessors() {
        let mut metadata = Metadata::new();
        metadata.insert(META_CHUNK_INDEX.to_string(), "4".to_string());
        metadata.insert(META_FILE_NAME.to_string(), "notes.md".to_string());
        let doc = Document {
            id: document_id("/x/notes.md", 4),
            content: "text".to_string(),
            source: "/x/notes.md".to_string(),
            embedding: vec![1.0],
            metadata,
            created_at: Utc::now(),
        };
        assert_eq!(doc.chunk_index(), Some(4));
        assert_eq!(doc.file_name(), Some("notes.md"));
    }

    #[test]
    fn test_metadata_serializes_in_key_order() {
        let mut metadata = Metadata::new();
        metadata.insert(META_FILE_NAME.to_string(), "notes.md".to_string());
        metadata.insert(META_CHUNK_INDEX.to_string(), "0".to_string());
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"chunk_index":"0","file_name":"notes.md"}"#
        );
    }
}
