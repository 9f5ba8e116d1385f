//! SQLite `DocumentStore` contract tests against a temp database file.

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use ragkb::sqlite_store::SqliteStore;
use ragkb_core::models::{document_id, Document, Metadata, META_CHUNK_INDEX, META_FILE_NAME};
use ragkb_core::store::DocumentStore;
use ragkb_core::Error;

async fn open_store(tmp: &TempDir) -> SqliteStore {
    let store = SqliteStore::open(&tmp.path().join("data").join("kb.sqlite"))
        .await
        .unwrap();
    store.initialize().await.unwrap();
    store
}

fn doc(source: &str, index: usize, embedding: Vec<f32>) -> Document {
    let mut metadata = Metadata::new();
    metadata.insert(META_CHUNK_INDEX.to_string(), index.to_string());
    metadata.insert(META_FILE_NAME.to_string(), "a.md".to_string());
    Document {
        id: document_id(source, index),
        content: format!("chunk {} of {}", index, source),
        source: source.to_string(),
        embedding,
        metadata,
        created_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
    }
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store.initialize().await.unwrap();
    store.initialize().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_document_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let original = doc("/kb/a.md", 0, vec![0.25, -1.5, 3.0]);

    let store = open_store(&tmp).await;
    store.add_document(&original).await.unwrap();
    store.close().await.unwrap();

    let store = open_store(&tmp).await;
    let loaded = store.get_document(&original.id).await.unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.chunk_index(), Some(0));
    assert_eq!(loaded.file_name(), Some("a.md"));
}

#[tokio::test]
async fn test_upsert_replaces_in_place() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let mut d = doc("/kb/a.md", 0, vec![1.0, 0.0]);
    store.add_document(&d).await.unwrap();
    d.content = "rewritten".to_string();
    d.embedding = vec![0.0, 1.0];
    store.add_documents(&[d.clone()]).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let loaded = store.get_document(&d.id).await.unwrap();
    assert_eq!(loaded.content, "rewritten");
    assert_eq!(loaded.embedding, vec![0.0, 1.0]);
}

#[tokio::test]
async fn test_search_two_documents() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let first = doc("/kb/a.md", 0, vec![1.0, 0.0]);
    let second = doc("/kb/a.md", 1, vec![0.0, 1.0]);
    store
        .add_documents(&[first.clone(), second.clone()])
        .await
        .unwrap();

    let top = store.search(&[1.0, 0.0], 1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].document.id, first.id);
    assert!((top[0].similarity - 1.0).abs() < 1e-9);

    let all = store.search(&[1.0, 0.0], 0).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].document.id, second.id);
    assert!(all[1].similarity.abs() < 1e-9);

    let more_than_corpus = store.search(&[1.0, 0.0], 10).await.unwrap();
    assert_eq!(more_than_corpus.len(), 2);
}

#[tokio::test]
async fn test_search_empty_corpus() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    assert!(store.search(&[1.0, 0.0], 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_is_sorted_with_id_tie_break() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let docs: Vec<Document> = (0..6)
        .map(|i| doc("/kb/b.md", i, vec![1.0, (i % 3) as f32]))
        .collect();
    store.add_documents(&docs).await.unwrap();

    let results = store.search(&[1.0, 0.0], 0).await.unwrap();
    assert_eq!(results.len(), 6);
    for pair in results.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
        if pair[0].similarity == pair[1].similarity {
            assert!(pair[0].document.id < pair[1].document.id);
        }
    }
}

#[tokio::test]
async fn test_failed_batch_leaves_store_unchanged() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let existing = doc("/kb/keep.md", 0, vec![1.0]);
    store.add_document(&existing).await.unwrap();

    // The batch rewrites `existing` first, then fails on its fourth new document.
    let mut rewritten = existing.clone();
    rewritten.content = "should not persist".to_string();
    let mut batch = vec![rewritten];
    batch.extend((0..5).map(|i| doc("/kb/new.md", i, vec![1.0])));
    batch[4].embedding = vec![1.0, f32::INFINITY];

    let err = store.add_documents(&batch).await.unwrap_err();
    assert!(matches!(err, Error::InvalidDocument { .. }));

    assert!(store.list_by_source("/kb/new.md").await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(
        store.get_document(&existing.id).await.unwrap().content,
        existing.content
    );
}

#[tokio::test]
async fn test_rejects_blank_content() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let mut d = doc("/kb/a.md", 0, vec![1.0]);
    d.content = " \n\t".to_string();
    assert!(matches!(
        store.add_document(&d).await,
        Err(Error::InvalidDocument { .. })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_ids_are_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store.add_document(&doc("/kb/a.md", 0, vec![1.0])).await.unwrap();

    assert!(store.get_document("0000000000000000").await.unwrap_err().is_not_found());
    assert!(store.delete_document("0000000000000000").await.unwrap_err().is_not_found());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_document() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let d = doc("/kb/a.md", 0, vec![1.0]);
    store.add_document(&d).await.unwrap();

    store.delete_document(&d.id).await.unwrap();
    assert!(store.get_document(&d.id).await.unwrap_err().is_not_found());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_and_delete_by_source() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let mut docs: Vec<Document> = (0..3).map(|i| doc("/kb/a.md", i, vec![1.0])).collect();
    docs.extend((0..2).map(|i| doc("/kb/b.md", i, vec![1.0])));
    docs[4].created_at = Utc.timestamp_millis_opt(1_800_000_000_000).unwrap();
    store.add_documents(&docs).await.unwrap();

    let mut indexes: Vec<usize> = store
        .list_by_source("/kb/a.md")
        .await
        .unwrap()
        .iter()
        .filter_map(|d| d.chunk_index())
        .collect();
    indexes.sort();
    assert_eq!(indexes, vec![0, 1, 2]);

    let sources = store.list_sources().await.unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].source, "/kb/a.md");
    assert_eq!(sources[0].chunks, 3);
    assert_eq!(sources[1].source, "/kb/b.md");
    assert_eq!(sources[1].last_ingested, docs[4].created_at);

    assert_eq!(store.delete_source("/kb/a.md").await.unwrap(), 3);
    assert_eq!(store.delete_source("/kb/a.md").await.unwrap(), 0);
    assert!(store.list_by_source("/kb/a.md").await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_closed_store_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store.add_document(&doc("/kb/a.md", 0, vec![1.0])).await.unwrap();
    store.close().await.unwrap();

    assert!(matches!(store.count().await, Err(Error::Closed)));
    assert!(matches!(store.search(&[1.0], 1).await, Err(Error::Closed)));
    assert!(matches!(store.get_document("x").await, Err(Error::Closed)));
    assert!(matches!(
        store.add_documents(&[doc("/kb/a.md", 1, vec![1.0])]).await,
        Err(Error::Closed)
    ));
    assert!(matches!(store.close().await, Err(Error::Closed)));
}
