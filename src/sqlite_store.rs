//! SQLite-backed [`DocumentStore`] implementation.
//!
//! One table, `documents`, keyed by the deterministic chunk id:
//!
//! | Column | Type | Notes |
//! |--------|------|-------|
//! | `id` | `TEXT PRIMARY KEY` | upsert key |
//! | `content` | `TEXT` | chunk text |
//! | `source` | `TEXT` | absolute path, indexed |
//! | `embedding` | `TEXT` | JSON array of numbers |
//! | `metadata` | `TEXT` | JSON object of strings |
//! | `created_at` | `INTEGER` | Unix milliseconds, indexed |
//!
//! Search loads every row and ranks in process; the `source` and
//! `created_at` indexes serve listing, purging, and audit queries only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use ragkb_core::models::{Document, Metadata, SearchResult, SourceSummary};
use ragkb_core::search::rank_documents;
use ragkb_core::store::{validate_document, DocumentStore};
use ragkb_core::{Error, Result};

use crate::db;

const UPSERT_SQL: &str = r#"
    INSERT INTO documents (id, content, source, embedding, metadata, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        content = excluded.content,
        source = excluded.source,
        embedding = excluded.embedding,
        metadata = excluded.metadata,
        created_at = excluded.created_at
"#;

const SELECT_COLUMNS: &str = "SELECT id, content, source, embedding, metadata, created_at FROM documents";

/// SQLite implementation of the [`DocumentStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to (creating if needed) the database at `path`.
    ///
    /// Does not create the schema; call [`DocumentStore::initialize`].
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(db::connect(path).await?))
    }

    fn pool(&self) -> Result<&SqlitePool> {
        if self.pool.is_closed() {
            return Err(Error::Closed);
        }
        Ok(&self.pool)
    }
}

/// Serialized column values for one document.
struct EncodedDocument<'a> {
    doc: &'a Document,
    embedding: String,
    metadata: String,
}

fn encode(doc: &Document) -> Result<EncodedDocument<'_>> {
    validate_document(doc)?;
    Ok(EncodedDocument {
        doc,
        embedding: serde_json::to_string(&doc.embedding).map_err(Error::storage)?,
        metadata: serde_json::to_string(&doc.metadata).map_err(Error::storage)?,
    })
}

fn upsert_query<'q>(
    enc: &'q EncodedDocument<'q>,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    sqlx::query(UPSERT_SQL)
        .bind(&enc.doc.id)
        .bind(&enc.doc.content)
        .bind(&enc.doc.source)
        .bind(&enc.embedding)
        .bind(&enc.metadata)
        .bind(enc.doc.created_at.timestamp_millis())
}

fn decode_row(row: &SqliteRow) -> Result<Document> {
    let embedding: String = row.try_get("embedding").map_err(Error::storage)?;
    let metadata: String = row.try_get("metadata").map_err(Error::storage)?;
    let created_at: i64 = row.try_get("created_at").map_err(Error::storage)?;

    Ok(Document {
        id: row.try_get("id").map_err(Error::storage)?,
        content: row.try_get("content").map_err(Error::storage)?,
        source: row.try_get("source").map_err(Error::storage)?,
        embedding: serde_json::from_str::<Vec<f32>>(&embedding).map_err(Error::storage)?,
        metadata: serde_json::from_str::<Metadata>(&metadata).map_err(Error::storage)?,
        created_at: millis_to_datetime(created_at),
    })
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        let pool = self.pool()?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                embedding TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(Error::storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source)")
            .execute(pool)
            .await
            .map_err(Error::storage)?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at)",
        )
        .execute(pool)
        .await
        .map_err(Error::storage)?;

        Ok(())
    }

    async fn add_document(&self, doc: &Document) -> Result<()> {
        let pool = self.pool()?;
        let enc = encode(doc)?;
        upsert_query(&enc)
            .execute(pool)
            .await
            .map_err(Error::storage)?;
        Ok(())
    }

    async fn add_documents(&self, docs: &[Document]) -> Result<()> {
        let pool = self.pool()?;
        // Dropping `tx` on any early return rolls the whole batch back.
        let mut tx = pool.begin().await.map_err(Error::storage)?;

        for doc in docs {
            let enc = encode(doc)?;
            upsert_query(&enc)
                .execute(&mut *tx)
                .await
                .map_err(Error::storage)?;
        }

        tx.commit().await.map_err(Error::storage)?;
        Ok(())
    }

    async fn search(&self, query: &[f32], limit: i64) -> Result<Vec<SearchResult>> {
        let pool = self.pool()?;
        let rows = sqlx::query(SELECT_COLUMNS)
            .fetch_all(pool)
            .await
            .map_err(Error::storage)?;

        let docs = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        Ok(rank_documents(query, docs, limit))
    }

    async fn get_document(&self, id: &str) -> Result<Document> {
        let pool = self.pool()?;
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Error::storage)?;

        match row {
            Some(row) => decode_row(&row),
            None => Err(Error::not_found(id)),
        }
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let pool = self.pool()?;
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .map_err(Error::storage)?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(id));
        }
        Ok(())
    }

    async fn list_by_source(&self, source: &str) -> Result<Vec<Document>> {
        let pool = self.pool()?;
        let rows = sqlx::query(&format!("{} WHERE source = ?", SELECT_COLUMNS))
            .bind(source)
            .fetch_all(pool)
            .await
            .map_err(Error::storage)?;

        rows.iter().map(decode_row).collect()
    }

    async fn delete_source(&self, source: &str) -> Result<u64> {
        let pool = self.pool()?;
        let result = sqlx::query("DELETE FROM documents WHERE source = ?")
            .bind(source)
            .execute(pool)
            .await
            .map_err(Error::storage)?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let pool = self.pool()?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
            .map_err(Error::storage)?;
        Ok(count as u64)
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let pool = self.pool()?;
        let rows = sqlx::query(
            r#"
            SELECT source, COUNT(*) AS chunks, MAX(created_at) AS last_ingested
            FROM documents
            GROUP BY source
            ORDER BY source ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(Error::storage)?;

        rows.iter()
            .map(|row| {
                let chunks: i64 = row.try_get("chunks").map_err(Error::storage)?;
                let last: i64 = row.try_get("last_ingested").map_err(Error::storage)?;
                Ok(SourceSummary {
                    source: row.try_get("source").map_err(Error::storage)?,
                    chunks: chunks as u64,
                    last_ingested: millis_to_datetime(last),
                })
            })
            .collect()
    }

    async fn close(&self) -> Result<()> {
        self.pool()?.close().await;
        Ok(())
    }
}
