//! File ingestion and context retrieval.
//!
//! The [`Retriever`] ties the three collaborators together:
//!
//! ```text
//! file ──▶ Chunker ──▶ Embedder (one batch per file) ──▶ DocumentStore (one atomic batch)
//! query ─▶ Embedder (single item) ──▶ DocumentStore::search ──▶ ranked results / context
//! ```
//!
//! # Ingestion guarantees
//!
//! - A file is chunked by paragraph and embedded in a single call. If the
//!   embedding call fails, nothing from that file is written.
//! - Document ids derive from the absolute path and chunk index, so
//!   re-ingesting a file upserts in place.
//! - [`Retriever::ingest_files`] is fail-fast: the first failing file
//!   aborts the rest, and files ingested before it stay persisted.
//!
//! Re-ingesting a file that now yields fewer chunks leaves the old trailing
//! chunks in place; call [`Retriever::delete_source`] first to replace a
//! source wholesale.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use ragkb_core::chunk::{ChunkOptions, Chunker};
use ragkb_core::embedding::Embedder;
use ragkb_core::models::{
    document_id, Document, Metadata, SearchResult, META_CHUNK_INDEX, META_FILE_NAME,
};
use ragkb_core::store::DocumentStore;
use ragkb_core::{Error, Result};

use crate::config::{default_include_globs, Config, DEFAULT_EMBED_MODEL};
use crate::embedding::create_embedder;

/// Header line of a rendered context block.
pub const CONTEXT_HEADER: &str = "Relevant context from knowledge base:";

#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Embedding model name passed to the [`Embedder`].
    pub model: String,
    pub chunking: ChunkOptions,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBED_MODEL.to_string(),
            chunking: ChunkOptions::default(),
        }
    }
}

impl RetrieverOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.embedding.model.clone(),
            chunking: config.chunking.options(),
        }
    }
}

/// Counts reported by a multi-file ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files: usize,
    pub chunks: usize,
}

pub struct Retriever {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    model: String,
    chunker: Chunker,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        options: RetrieverOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            model: options.model,
            chunker: Chunker::new(options.chunking),
        }
    }

    /// Wire a retriever to `store` with the configured embedder and options.
    pub fn from_config(config: &Config, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        Ok(Self::new(store, embedder, RetrieverOptions::from_config(config)))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Ingest one file and return the number of chunks written.
    ///
    /// The path goes through [`source_path`] before it is used as the
    /// document source.
    /// A file with no non-blank text writes nothing and skips the embedder.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let file_path = source_path(path)?;
        let bytes = tokio::fs::read(&file_path)
            .await
            .map_err(|e| Error::io(&file_path, e))?;
        let text = String::from_utf8_lossy(&bytes);

        let chunks = self.chunker.chunk_by_paragraph(&text);
        if chunks.is_empty() {
            tracing::warn!(path = %file_path.display(), "no text to ingest");
            return Ok(0);
        }

        let embeddings = self.embed(&chunks).await?;

        let source = file_path.to_string_lossy().to_string();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let created_at = Utc::now();

        let docs: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| {
                let mut metadata = Metadata::new();
                metadata.insert(META_CHUNK_INDEX.to_string(), index.to_string());
                metadata.insert(META_FILE_NAME.to_string(), file_name.clone());
                Document {
                    id: document_id(&source, index),
                    content,
                    source: source.clone(),
                    embedding,
                    metadata,
                    created_at,
                }
            })
            .collect();

        self.store.add_documents(&docs).await?;

        tracing::info!(path = %source, chunks = docs.len(), "ingested file");
        Ok(docs.len())
    }

    /// Ingest files in order, stopping at the first failure.
    pub async fn ingest_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();
        for path in paths {
            let path = path.as_ref();
            match self.ingest_file(path).await {
                Ok(chunks) => {
                    summary.files += 1;
                    summary.chunks += chunks;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        ingested = summary.files,
                        remaining = paths.len() - summary.files - 1,
                        error = %e,
                        "ingestion aborted"
                    );
                    return Err(e);
                }
            }
        }
        Ok(summary)
    }

    /// Walk `root` recursively and ingest every file whose base name matches
    /// one of `patterns` (the default set when `patterns` is empty).
    pub async fn ingest_directory(&self, root: &Path, patterns: &[String]) -> Result<IngestSummary> {
        let files = collect_files(root, patterns)?;
        tracing::info!(root = %root.display(), files = files.len(), "ingesting directory");
        self.ingest_files(&files).await
    }

    /// Embed `query` and return the `limit` most similar chunks.
    ///
    /// A blank query returns no results without calling the embedder.
    pub async fn retrieve(&self, query: &str, limit: i64) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = self.embed(&[query.to_string()]).await?;
        let query_embedding = embeddings.remove(0);
        if let Some(i) = query_embedding.iter().position(|v| !v.is_finite()) {
            return Err(Error::embedding(format!(
                "{} returned a non-finite query embedding component at {}",
                self.embedder.name(),
                i
            )));
        }

        let results = self.store.search(&query_embedding, limit).await?;
        tracing::debug!(
            limit,
            results = results.len(),
            best = results.first().map(|r| r.similarity),
            "retrieved"
        );
        Ok(results)
    }

    /// Retrieve and render the results as a context block.
    ///
    /// Returns an empty string when nothing matched, meaning "no
    /// augmentation available".
    pub async fn retrieve_context(&self, query: &str, limit: i64) -> Result<String> {
        let results = self.retrieve(query, limit).await?;
        Ok(render_context(&results))
    }

    /// Remove every chunk of `source` atomically and return how many were
    /// removed.
    pub async fn delete_source(&self, source: &str) -> Result<u64> {
        let removed = self.store.delete_source(source).await?;
        tracing::info!(source, removed, "deleted source");
        Ok(removed)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self
            .embedder
            .embed(&self.model, texts)
            .await
            .map_err(Error::embedding)?;

        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} texts",
                self.embedder.name(),
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Render ranked results in order, each annotated with its similarity.
///
/// ```rust
/// use ragkb::retriever::render_context;
///
/// assert_eq!(render_context(&[]), "");
/// ```
pub fn render_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut out = format!("{}\n\n", CONTEXT_HEADER);
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "--- Document {} (similarity: {:.3}) ---\n{}\n\n",
            i + 1,
            result.similarity,
            result.document.content
        ));
    }
    out
}

/// Build the user-role turn for the chat pipeline.
pub fn augment_query(context: &str, query: &str) -> String {
    if context.is_empty() {
        query.to_string()
    } else {
        format!("{}\n\nUser question: {}", context, query)
    }
}

/// Recursively list files under `root` whose base name matches one of
/// `patterns`, in sorted path order.
pub fn collect_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let matcher = if patterns.is_empty() {
        build_globset(&default_include_globs())?
    } else {
        build_globset(patterns)?
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::io(path, e.into())
        })?;
        // Follows symlinked files; symlinked directories are not descended.
        if !entry.path().is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.kind().to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| Error::InvalidPattern {
        pattern: patterns.join(","),
        reason: e.to_string(),
    })
}

/// Absolute, lexically cleaned form of `path` used as a document source.
///
/// `.` and `..` components are resolved without touching the filesystem,
/// so `docs/a.md` and `docs/../docs/a.md` name the same source. Symlinks
/// are not resolved.
pub fn source_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| Error::io(path, e))?;
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    Ok(cleaned)
}
