//! Deterministic embedding providers and fixtures shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rag_context::config::RetrievalConfig;
use rag_context::embedding::EmbeddingProvider;
use rag_context::error::{RagError, Result};
use rag_context::models::{ChunkMetadata, ContentChunk, EmbeddedChunk, TaxonomyItem};
use rag_context::search::Retriever;
use rag_context::store::VectorStore;
use rag_context::taxonomy::TaxonomyIndex;
use rag_context::url_mapper::ContentUrlMapper;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MODEL: &str = "test-model";

/// Returns the same vector for every input and counts calls.
pub struct FixedProvider {
    pub vector: Vec<f32>,
    pub dims: usize,
    pub fail: bool,
    pub delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            dims: vector.len(),
            vector,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(dims: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(vec![0.0; dims])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FixedProvider {
    fn model_name(&self) -> &str {
        MODEL
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RagError::Provider("upstream returned 503".to_string()));
        }
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }
}

/// Bag-of-words embedding over a fixed vocabulary, one dimension per term.
pub struct VocabularyProvider {
    pub vocabulary: Vec<&'static str>,
}

#[async_trait]
impl EmbeddingProvider for VocabularyProvider {
    fn model_name(&self) -> &str {
        MODEL
    }
    fn dims(&self) -> usize {
        self.vocabulary.len()
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let tokens: Vec<&str> = lower
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .filter(|t| !t.is_empty())
                    .collect();
                self.vocabulary
                    .iter()
                    .map(|term| tokens.iter().filter(|t| *t == term).count() as f32)
                    .collect()
            })
            .collect())
    }
}

pub fn meta(content_type: &str, role: Option<&str>, language: Option<&str>) -> ChunkMetadata {
    ChunkMetadata {
        content_type: Some(content_type.to_string()),
        role: role.map(str::to_string),
        language: language.map(str::to_string),
        ..ChunkMetadata::default()
    }
}

pub fn embedded(id: &str, source_path: &str, metadata: ChunkMetadata, vector: Vec<f32>) -> EmbeddedChunk {
    EmbeddedChunk {
        chunk: ContentChunk {
            id: id.to_string(),
            title: id.to_string(),
            source_path: source_path.to_string(),
            chunk_index: 0,
            text: format!("text of {}", id),
            metadata,
        },
        vector,
    }
}

pub fn fetch_client_item() -> TaxonomyItem {
    TaxonomyItem {
        id: "ts-client-fetch".to_string(),
        path: "examples/typescript/clients/fetch".to_string(),
        content_type: "example".to_string(),
        role: Some("client".to_string()),
        language: Some("typescript".to_string()),
        framework: Some("fetch".to_string()),
        complexity: Some("beginner".to_string()),
        title: "Fetch Client".to_string(),
        description: "Pay for a resource with fetch".to_string(),
    }
}

pub fn mapper(items: Vec<TaxonomyItem>) -> Arc<ContentUrlMapper> {
    Arc::new(ContentUrlMapper::new(
        Arc::new(TaxonomyIndex::new(items, "content")),
        "/content",
    ))
}

pub fn retriever(
    chunks: Vec<EmbeddedChunk>,
    items: Vec<TaxonomyItem>,
    provider: Arc<dyn EmbeddingProvider>,
) -> Retriever {
    let dims = provider.dims();
    let store = VectorStore::new(MODEL, dims, chunks).unwrap();
    Retriever::new(
        Arc::new(store),
        mapper(items),
        provider,
        RetrievalConfig::default(),
    )
    .unwrap()
}
