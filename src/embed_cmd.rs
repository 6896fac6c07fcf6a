//! Batch embedding of ingested chunks.
//!
//! Each chunk is rendered as `"Title: <title>\n\n<text>"` and sent to the
//! provider in batches of at most `batch_size`. Batches run sequentially so
//! chunk-to-vector correspondence follows input order. Any failure aborts
//! the whole run: a partial or dimension-inconsistent result is never
//! returned, so it can never be persisted.

use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::models::{ContentChunk, EmbeddedChunk};

/// Text sent to the provider for a chunk.
pub fn embedding_input(chunk: &ContentChunk) -> String {
    format!("Title: {}\n\n{}", chunk.title, chunk.text)
}

/// Embed all chunks, preserving order.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: Vec<ContentChunk>,
    batch_size: usize,
) -> Result<Vec<EmbeddedChunk>> {
    let batch_size = batch_size.max(1);
    let dims = provider.dims();
    let total_batches = chunks.len().div_ceil(batch_size);
    let mut embedded = Vec::with_capacity(chunks.len());
    let mut remaining = chunks.into_iter().peekable();
    let mut batch_no = 0usize;

    while remaining.peek().is_some() {
        let batch: Vec<ContentChunk> = remaining.by_ref().take(batch_size).collect();
        batch_no += 1;
        info!(batch = batch_no, total = total_batches, size = batch.len(), "embedding batch");

        let texts: Vec<String> = batch.iter().map(embedding_input).collect();
        let vectors = provider.embed_batch(&texts).await?;

        if vectors.len() != batch.len() {
            return Err(RagError::Consistency(format!(
                "batch {} returned {} vectors for {} inputs",
                batch_no,
                vectors.len(),
                batch.len()
            )));
        }

        for (chunk, vector) in batch.into_iter().zip(vectors) {
            if vector.len() != dims {
                return Err(RagError::Consistency(format!(
                    "chunk '{}' embedded with {} dimensions, provider '{}' declares {}",
                    chunk.id,
                    vector.len(),
                    provider.model_name(),
                    dims
                )));
            }
            embedded.push(EmbeddedChunk { chunk, vector });
        }
    }

    Ok(embedded)
}
