//! Core data models used throughout the retrieval pipeline.
//!
//! These types represent the taxonomy records, chunks, embedded chunks, and
//! search results that flow from ingestion to context assembly. Wire names
//! are camelCase so the persisted store keeps the field names other tools
//! expect (`sourcePath`, `chunkIndex`).

use serde::{Deserialize, Serialize};

/// A curated catalog record mapping a content path to canonical metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyItem {
    pub id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Retrieval metadata attached to every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
}

impl From<&TaxonomyItem> for ChunkMetadata {
    fn from(item: &TaxonomyItem) -> Self {
        Self {
            content_type: Some(item.content_type.clone()),
            role: item.role.clone(),
            language: item.language.clone(),
            framework: item.framework.clone(),
            complexity: item.complexity.clone(),
        }
    }
}

/// A bounded slice of a source document, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub id: String,
    pub title: String,
    pub source_path: String,
    pub chunk_index: usize,
    pub text: String,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// A chunk together with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    #[serde(flatten)]
    pub chunk: ContentChunk,
    pub vector: Vec<f32>,
}

/// A scored chunk returned by the search engine.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub chunk: ContentChunk,
    pub similarity: f32,
}

/// Caller role detected in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Server,
    Facilitator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
            Role::Facilitator => "facilitator",
        }
    }
}

/// Structured interpretation of a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntent {
    pub wants_examples: bool,
    pub wants_quickstart: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub keywords: Vec<String>,
}
