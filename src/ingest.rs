//! Ingestion commands: `kb add` and `kb remove`.
//!
//! `add` accepts any mix of files and directories. Files are ingested as
//! given; directories are walked and filtered by base-name globs. Targets
//! are processed in argument order and the first failure aborts the rest.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::db;
use crate::retriever::{collect_files, source_path, IngestSummary, Retriever};

pub async fn run_add(config: &Config, paths: &[PathBuf], patterns: &[String]) -> Result<()> {
    let patterns = if patterns.is_empty() {
        config.retrieval.include_globs.clone()
    } else {
        patterns.to_vec()
    };

    let files = expand_targets(paths, &patterns)?;
    if files.is_empty() {
        println!("No matching files.");
        return Ok(());
    }

    let store = Arc::new(db::open_store(config).await?);
    let retriever = Retriever::from_config(config, store)?;

    let result = retriever.ingest_files(&files).await;
    retriever.store().close().await?;
    let IngestSummary { files, chunks } = result?;

    println!("Ingested {} files ({} chunks).", files, chunks);
    Ok(())
}

/// Resolve command-line targets to the ordered list of files to ingest.
fn expand_targets(paths: &[PathBuf], patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = collect_files(path, patterns)
                .with_context(|| format!("Failed to scan {}", path.display()))?;
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

pub async fn run_remove(config: &Config, source: &Path) -> Result<()> {
    let source =
        source_path(source).with_context(|| format!("Invalid path: {}", source.display()))?;
    let source = source.to_string_lossy();

    let store = Arc::new(db::open_store(config).await?);
    let retriever = Retriever::from_config(config, store)?;

    let result = retriever.delete_source(&source).await;
    retriever.store().close().await?;
    let removed = result?;

    println!("Removed {} chunks of {}", removed, source);
    Ok(())
}
