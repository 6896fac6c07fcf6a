//! Error types for the retrieval pipeline.
//!
//! Library code returns [`RagError`]; the CLI and server wrap it in
//! `anyhow` or map it onto HTTP status codes. A URL-mapper miss is not an
//! error at all: it is an `Option::None` and the citation is omitted.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or querying the vector store.
#[derive(Error, Debug)]
pub enum RagError {
    /// The embedding call failed (network, auth, rate limit, disabled provider).
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// Model or dimension mismatch between the store, the provider, and a query vector.
    #[error("Store consistency error: {0}")]
    Consistency(String),

    /// A source tree or taxonomy catalog could not be ingested.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Out-of-range search options supplied by a caller.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RagError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
