//! # ragkb CLI (`kb`)
//!
//! Operates a local knowledge base: ingest files, inspect what is stored,
//! and produce retrieval context for a chat model.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kb init` | Create the SQLite database and schema |
//! | `kb add <path>...` | Ingest files and directories |
//! | `kb search "<query>"` | Rank stored chunks against a query |
//! | `kb context "<query>"` | Print the context block (or `--augment` the full user turn) |
//! | `kb get <id>` | Show one stored chunk |
//! | `kb delete <id>` | Delete one stored chunk |
//! | `kb remove <path>` | Delete every chunk of a source file |
//! | `kb sources` | List ingested sources |
//!
//! Logs go to stderr. `--verbose` forces debug level; otherwise `RUST_LOG`,
//! then `log.level` from the config, sets the filter.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragkb::config::{self, Config};
use ragkb::{get, ingest, search, sources};
use ragkb_core::store::DocumentStore;

/// ragkb: a local knowledge base for retrieval-augmented chat.
///
/// Configuration is read from `--config`, then `RAGKB_CONFIG`, then
/// `~/.ragkb/config.toml`; a missing file means defaults.
#[derive(Parser)]
#[command(name = "kb", version, about = "Local knowledge base for retrieval-augmented chat")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and schema. Safe to run repeatedly.
    Init,

    /// Ingest files and directories.
    ///
    /// Directories are walked recursively; only files whose name matches a
    /// pattern are ingested. Stops at the first failing file.
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Glob matched against file names (repeatable). Defaults to
        /// `retrieval.include_globs`.
        #[arg(long = "pattern")]
        patterns: Vec<String>,
    },

    /// Rank stored chunks against a query.
    Search {
        query: String,

        /// Maximum number of results (default: `retrieval.top_k`; 0 = all).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print the retrieval context block for a query.
    Context {
        query: String,

        #[arg(long)]
        limit: Option<i64>,

        /// Print the full augmented user turn instead of the bare context.
        #[arg(long)]
        augment: bool,
    },

    /// Show one stored chunk by id.
    Get { id: String },

    /// Delete one stored chunk by id.
    Delete { id: String },

    /// Delete every chunk ingested from a file.
    Remove { source: PathBuf },

    /// List ingested sources with chunk counts.
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&config::config_path(cli.config.as_deref()))?;
    init_logging(&cfg, cli.verbose);

    match cli.command {
        Commands::Init => {
            let store = ragkb::db::open_store(&cfg).await?;
            store.close().await?;
            println!("Knowledge base initialized at {}", cfg.db.path.display());
        }
        Commands::Add { paths, patterns } => {
            ingest::run_add(&cfg, &paths, &patterns).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Context {
            query,
            limit,
            augment,
        } => {
            search::run_context(&cfg, &query, limit, augment).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Delete { id } => {
            get::run_delete(&cfg, &id).await?;
        }
        Commands::Remove { source } => {
            ingest::run_remove(&cfg, &source).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg).await?;
        }
    }

    Ok(())
}

fn init_logging(cfg: &Config, verbose: bool) {
    let directives = |level: &str| format!("ragkb={0},ragkb_core={0},kb={0}", level);

    // `--verbose` wins over `RUST_LOG`, which wins over the config file.
    let filter = if verbose {
        EnvFilter::new(directives("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(directives(
                &cfg.log.level.to_lowercase().replace("warning", "warn"),
            ))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
