//! Flat vector store persisted as a single JSON file.
//!
//! The file is an envelope stamped with the embedding model and dimension
//! that produced it, followed by the ordered chunk records:
//!
//! ```json
//! { "model": "text-embedding-3-small", "dims": 1536, "created_at": "…",
//!   "chunks": [ { "id": "…", "title": "…", "sourcePath": "…",
//!                 "chunkIndex": 0, "metadata": {…}, "text": "…",
//!                 "vector": [ … ] } ] }
//! ```
//!
//! The store is regenerated wholesale and written through a temporary file
//! in the same directory that is then renamed over the target, so a crash
//! mid-write leaves the previous store intact. Once loaded it is read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::models::EmbeddedChunk;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    model: String,
    dims: usize,
    created_at: DateTime<Utc>,
    chunks: Vec<EmbeddedChunk>,
}

impl VectorStore {
    /// Build a store, rejecting any vector whose length is not `dims`.
    pub fn new(model: &str, dims: usize, chunks: Vec<EmbeddedChunk>) -> Result<Self> {
        let store = Self {
            model: model.to_string(),
            dims,
            created_at: Utc::now(),
            chunks,
        };
        store.check_dimensions()?;
        Ok(store)
    }

    fn check_dimensions(&self) -> Result<()> {
        if let Some(bad) = self.chunks.iter().find(|c| c.vector.len() != self.dims) {
            return Err(RagError::Consistency(format!(
                "chunk '{}' has {} dimensions, store expects {}",
                bad.chunk.id,
                bad.vector.len(),
                self.dims
            )));
        }
        Ok(())
    }

    /// Load and validate a store file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let store: VectorStore = serde_json::from_str(&content)?;
        store.check_dimensions()?;
        info!(
            path = %path.display(),
            chunks = store.chunks.len(),
            model = %store.model,
            "loaded vector store"
        );
        Ok(store)
    }

    /// Write the store atomically: temp file in the target directory, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| RagError::io(&dir, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| RagError::io(&dir, e))?;
        serde_json::to_writer(&mut tmp, self)?;
        tmp.flush().map_err(|e| RagError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| RagError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| RagError::io(path, e.error))?;

        info!(path = %path.display(), chunks = self.chunks.len(), "wrote vector store");
        Ok(())
    }

    /// Fail fast when the query-side provider does not match the corpus.
    ///
    /// An empty store has nothing to compare against and always passes.
    pub fn ensure_compatible(&self, provider: &dyn EmbeddingProvider) -> Result<()> {
        if self.chunks.is_empty() {
            return Ok(());
        }
        if provider.model_name() != self.model {
            return Err(RagError::Consistency(format!(
                "store was built with model '{}' but the configured provider uses '{}'; \
                 rebuild the store or change [embedding].model",
                self.model,
                provider.model_name()
            )));
        }
        if provider.dims() != self.dims {
            return Err(RagError::Consistency(format!(
                "store has {} dimensions but provider '{}' declares {}",
                self.dims,
                provider.model_name(),
                provider.dims()
            )));
        }
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn chunks(&self) -> &[EmbeddedChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
