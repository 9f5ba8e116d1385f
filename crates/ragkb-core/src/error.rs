//! Error type shared by the store, embedding, and retrieval layers.
//!
//! Every failure the retrieval core can surface maps to one [`Error`]
//! variant so callers can branch on the kind (absent vs broken) instead of
//! parsing messages. Nothing in the core retries; the caller decides.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error from a backend (sqlx, reqwest, serde_json, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("document not found: {id}")]
    NotFound { id: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embedding request failed: {0}")]
    Embedding(#[source] BoxError),

    #[error("storage error: {0}")]
    Storage(#[source] BoxError),

    #[error("invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },

    #[error("invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("document store is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound { id: id.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn embedding(err: impl Into<BoxError>) -> Self {
        Error::Embedding(err.into())
    }

    pub fn storage(err: impl Into<BoxError>) -> Self {
        Error::Storage(err.into())
    }

    /// True for the "absent" kind returned by lookups and deletes by id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct() {
        assert!(Error::not_found("abc").is_not_found());
        assert!(!Error::Closed.is_not_found());
        assert!(!Error::storage("disk full").is_not_found());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::not_found("abc").to_string(),
            "document not found: abc"
        );
        let err = Error::embedding(anyhow::anyhow!("connection refused"));
        assert_eq!(
            err.to_string(),
            "embedding request failed: connection refused"
        );
        let err = Error::io(
            "/tmp/missing.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().starts_with("failed to read /tmp/missing.md"));
    }
}
