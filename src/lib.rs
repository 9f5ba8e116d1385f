//! # ragkb
//!
//! A local knowledge base for retrieval-augmented chat.
//!
//! Files are split into overlapping, boundary-aware chunks, embedded by an
//! external model, and stored in SQLite. At question time the query is
//! embedded, the corpus is ranked by cosine similarity, and the best chunks
//! are rendered into a context block that is prepended to the user's turn.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Files/Dirs │──▶│   Retriever  │──▶│    SQLite    │
//! │  (globs)    │   │ Chunk+Embed  │   │ DocumentStore│
//! └─────────────┘   └──────┬───────┘   └──────┬───────┘
//!                          │                  │
//!                   ┌──────▼───────┐          │
//!                   │   Embedder   │   full-scan cosine
//!                   │ Ollama/OpenAI│    ranking  │
//!                   └──────────────┘          ▼
//!                                       context block
//! ```
//!
//! The pure pieces (document model, chunker, similarity, store and
//! embedder traits, in-memory store) live in the `ragkb-core` crate.
//!
//! ## Quick Start
//!
//! ```bash
//! kb init                          # create the database
//! kb add ./docs --pattern '*.md'   # ingest a directory
//! kb search "how do I deploy"      # ranked chunks
//! kb context "how do I deploy"     # context block for a chat model
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`db`] | SQLite connection pool |
//! | [`sqlite_store`] | SQLite [`DocumentStore`](ragkb_core::store::DocumentStore) |
//! | [`embedding`] | Ollama and OpenAI-compatible embedders |
//! | [`retriever`] | Ingestion, retrieval, and context rendering |
//! | [`ingest`], [`search`], [`get`], [`sources`] | `kb` command implementations |

pub mod config;
pub mod db;
pub mod embedding;
pub mod get;
pub mod ingest;
pub mod retriever;
pub mod search;
pub mod sources;
pub mod sqlite_store;
