//! Query commands: `kb search` and `kb context`.
//!
//! Both embed the query with the configured model and rank the whole
//! corpus by cosine similarity. `search` prints a result table;
//! `context` prints the rendered context block handed to a chat model,
//! or with `--augment` the complete user turn.

use anyhow::Result;
use std::sync::Arc;

use ragkb_core::models::SearchResult;

use crate::config::Config;
use crate::db;
use crate::retriever::{augment_query, render_context, Retriever};

async fn open(config: &Config) -> Result<Retriever> {
    let store = Arc::new(db::open_store(config).await?);
    Retriever::from_config(config, store)
}

pub async fn run_search(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    let retriever = open(config).await?;
    let limit = limit.unwrap_or(config.retrieval.top_k);

    let results = retriever.retrieve(query, limit).await;
    retriever.store().close().await?;
    let results = results?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result);
    }
    Ok(())
}

fn print_result(rank: usize, result: &SearchResult) {
    let doc = &result.document;
    let chunk = doc
        .chunk_index()
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{}. [{:.3}] {} (chunk {})",
        rank, result.similarity, doc.source, chunk
    );
    println!("    id: {}", doc.id);
    println!("    {}", snippet(&doc.content, 160));
    println!();
}

/// First `max_chars` characters on one line.
fn snippet(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}

pub async fn run_context(
    config: &Config,
    query: &str,
    limit: Option<i64>,
    augment: bool,
) -> Result<()> {
    let retriever = open(config).await?;
    let limit = limit.unwrap_or(config.retrieval.top_k);

    let results = retriever.retrieve(query, limit).await;
    retriever.store().close().await?;
    let context = render_context(&results?);

    if augment {
        println!("{}", augment_query(&context, query));
    } else if context.is_empty() {
        tracing::info!("no relevant context found");
    } else {
        print!("{}", context);
    }
    Ok(())
}
