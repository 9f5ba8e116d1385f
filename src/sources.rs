//! `kb sources`: per-source audit listing.

use anyhow::Result;

use ragkb_core::store::DocumentStore;

use crate::config::Config;
use crate::db;

pub async fn list_sources(config: &Config) -> Result<()> {
    let store = db::open_store(config).await?;
    let sources = store.list_sources().await;
    store.close().await?;
    let sources = sources?;

    if sources.is_empty() {
        println!("No sources ingested.");
        return Ok(());
    }

    println!("{:<8} {:<20} SOURCE", "CHUNKS", "LAST INGESTED");
    for summary in &sources {
        println!(
            "{:<8} {:<20} {}",
            summary.chunks,
            summary.last_ingested.format("%Y-%m-%d %H:%M:%S"),
            summary.source
        );
    }

    let total: u64 = sources.iter().map(|s| s.chunks).sum();
    println!();
    println!("{} sources, {} chunks", sources.len(), total);
    Ok(())
}
