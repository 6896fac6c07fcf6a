//! Similarity search over the vector store.
//!
//! Ranking is a pure function ([`rank`]): exact-match metadata filter,
//! cosine similarity, stable descending sort, threshold, truncate. The
//! [`Retriever`] wraps it with query embedding and an intent-driven filter
//! that is relaxed at most once when the strict filter finds nothing.
//!
//! The provider call is the only suspension point. Ranking runs after it
//! returns, so dropping a pending search abandons it without partial output.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, RetrievalConfig};
use crate::context::build_context;
use crate::embedding::{cosine_similarity, create_provider, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::intent::analyze_query;
use crate::models::{ChunkMetadata, EmbeddedChunk, QueryIntent, SearchResult};
use crate::store::VectorStore;
use crate::taxonomy::{load_catalog, TaxonomyIndex};
use crate::url_mapper::ContentUrlMapper;

/// Exact-match constraints on chunk metadata. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
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

impl MetadataFilter {
    /// Strict filter for an intent: content type, role and language.
    pub fn from_intent(intent: &QueryIntent) -> Self {
        let content_type = if intent.wants_quickstart {
            Some("quickstart".to_string())
        } else if intent.wants_examples {
            Some("example".to_string())
        } else {
            None
        };

        Self {
            content_type,
            role: intent.role.map(|r| r.as_str().to_string()),
            language: intent.language.clone(),
            ..Self::default()
        }
    }

    /// The same filter with only the content type kept.
    pub fn relaxed(&self) -> Self {
        Self {
            content_type: self.content_type.clone(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        field_matches(&self.content_type, &meta.content_type)
            && field_matches(&self.role, &meta.role)
            && field_matches(&self.language, &meta.language)
            && field_matches(&self.framework, &meta.framework)
            && field_matches(&self.complexity, &meta.complexity)
    }
}

fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        Some(w) => actual.as_deref() == Some(w.as_str()),
        None => true,
    }
}

/// Per-call overrides of the configured retrieval policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub min_similarity: Option<f32>,
    /// Caller-supplied filter. Replaces intent derivation and disables the fallback.
    #[serde(default)]
    pub filter_by: Option<MetadataFilter>,
}

impl SearchOptions {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == Some(0) {
            return Err(RagError::InvalidRequest("top_k must be at least 1".to_string()));
        }
        if let Some(s) = self.min_similarity {
            if !(-1.0..=1.0).contains(&s) {
                return Err(RagError::InvalidRequest(format!(
                    "min_similarity must be within [-1, 1], got {}",
                    s
                )));
            }
        }
        Ok(())
    }
}

/// Rank chunks against a query vector.
///
/// Results are sorted by similarity descending (ties keep store order),
/// every similarity is at least `min_similarity`, and at most `top_k` are
/// returned.
pub fn rank(
    chunks: &[EmbeddedChunk],
    query_vector: &[f32],
    top_k: usize,
    min_similarity: f32,
    filter: Option<&MetadataFilter>,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = chunks
        .iter()
        .filter(|c| filter.map_or(true, |f| f.matches(&c.chunk.metadata)))
        .map(|c| SearchResult {
            chunk: c.chunk.clone(),
            similarity: cosine_similarity(query_vector, &c.vector),
        })
        .filter(|r| r.similarity >= min_similarity)
        .collect();

    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);
    results
}

/// Filter stages of an intent-driven search.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterStage {
    Strict(MetadataFilter),
    Relaxed(MetadataFilter),
}

/// Query-time entry point: store, citation mapper, provider and policy.
///
/// All parts are immutable and shared by `Arc`, so a `Retriever` can be
/// cloned into concurrent tasks freely.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<VectorStore>,
    mapper: Arc<ContentUrlMapper>,
    provider: Arc<dyn EmbeddingProvider>,
    policy: RetrievalConfig,
}

impl Retriever {
    /// Fails with a consistency error when the provider cannot have produced
    /// the store's vectors.
    pub fn new(
        store: Arc<VectorStore>,
        mapper: Arc<ContentUrlMapper>,
        provider: Arc<dyn EmbeddingProvider>,
        policy: RetrievalConfig,
    ) -> Result<Self> {
        store.ensure_compatible(provider.as_ref())?;
        Ok(Self {
            store,
            mapper,
            provider,
            policy,
        })
    }

    /// Load the store, taxonomy and provider named by the config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = VectorStore::load(&config.store.path).with_context(|| {
            format!(
                "failed to load vector store {} (run `ragctx ingest` first)",
                config.store.path.display()
            )
        })?;
        let mapper = load_mapper(config)?;
        let provider = create_provider(&config.embedding)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(mapper),
            provider,
            config.retrieval,
        )?)
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn mapper(&self) -> &ContentUrlMapper {
        &self.mapper
    }

    pub fn policy(&self) -> RetrievalConfig {
        self.policy
    }

    /// Embed the query, or `None` when there is nothing to search.
    async fn embed_query(&self, query: &str) -> Result<Option<Vec<f32>>> {
        if query.trim().is_empty() || self.store.is_empty() {
            return Ok(None);
        }

        let vector = self.provider.embed(query).await?;
        if vector.len() != self.store.dims() {
            return Err(RagError::Consistency(format!(
                "query embedded with {} dimensions, store has {}",
                vector.len(),
                self.store.dims()
            )));
        }
        Ok(Some(vector))
    }

    fn resolve_limits(&self, options: &SearchOptions) -> (usize, f32) {
        (
            options.top_k.unwrap_or(self.policy.top_k),
            options.min_similarity.unwrap_or(self.policy.min_similarity),
        )
    }

    /// Plain similarity search with an optional caller filter.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        options.validate()?;
        let Some(query_vector) = self.embed_query(query).await? else {
            return Ok(Vec::new());
        };
        let (top_k, min_similarity) = self.resolve_limits(options);
        Ok(rank(
            self.store.chunks(),
            &query_vector,
            top_k,
            min_similarity,
            options.filter_by.as_ref(),
        ))
    }

    /// Search filtered by the query's intent, relaxing role and language
    /// once when the strict filter finds nothing.
    ///
    /// A caller-supplied `filter_by` is used as-is with no fallback.
    pub async fn search_with_intent(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        if options.filter_by.is_some() {
            return self.search(query, options).await;
        }
        options.validate()?;

        let Some(query_vector) = self.embed_query(query).await? else {
            return Ok(Vec::new());
        };
        let (top_k, min_similarity) = self.resolve_limits(options);
        let chunks = self.store.chunks();

        let intent = analyze_query(query);
        let mut stage = FilterStage::Strict(MetadataFilter::from_intent(&intent));
        loop {
            match stage {
                FilterStage::Strict(filter) => {
                    let results = rank(chunks, &query_vector, top_k, min_similarity, Some(&filter));
                    let relaxed = filter.relaxed();
                    if !results.is_empty() || relaxed == filter {
                        debug!(?filter, hits = results.len(), "strict search");
                        return Ok(results);
                    }
                    debug!(?filter, ?relaxed, "strict search empty, relaxing filter");
                    stage = FilterStage::Relaxed(relaxed);
                }
                FilterStage::Relaxed(filter) => {
                    let results = rank(chunks, &query_vector, top_k, min_similarity, Some(&filter));
                    debug!(?filter, hits = results.len(), "relaxed search");
                    return Ok(results);
                }
            }
        }
    }

    /// Intent-driven search rendered as a citation-annotated context block.
    pub async fn get_relevant_context(&self, query: &str, options: &SearchOptions) -> Result<String> {
        let results = self.search_with_intent(query, options).await?;
        Ok(build_context(&results, &self.mapper))
    }
}

/// Citation mapper from the configured taxonomy, or an empty one.
pub fn load_mapper(config: &Config) -> Result<ContentUrlMapper> {
    let index = match &config.taxonomy.path {
        Some(path) => TaxonomyIndex::new(load_catalog(path)?, &config.taxonomy.content_prefix),
        None => TaxonomyIndex::empty(),
    };
    Ok(ContentUrlMapper::new(Arc::new(index), &config.taxonomy.url_base))
}

// ============ CLI commands ============

pub async fn run_search(
    config: &Config,
    query: &str,
    options: SearchOptions,
    json: bool,
) -> anyhow::Result<()> {
    let retriever = Retriever::from_config(config)?;
    let results = if options.filter_by.is_some() {
        retriever.search(query, &options).await?
    } else {
        retriever.search_with_intent(query, &options).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        let chunk = &result.chunk;
        println!(
            "{}. [{:.3}] {} / {}",
            i + 1,
            result.similarity,
            chunk.source_path,
            chunk.title
        );
        if let Some(url) = retriever.mapper().get_content_url(&chunk.source_path) {
            println!("    url: {}", url);
        }
        let meta = &chunk.metadata;
        println!(
            "    type: {}  role: {}  language: {}",
            meta.content_type.as_deref().unwrap_or("-"),
            meta.role.as_deref().unwrap_or("-"),
            meta.language.as_deref().unwrap_or("-"),
        );
        let excerpt: String = chunk.text.chars().take(160).collect();
        println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
        println!("    id: {}", chunk.id);
        println!();
    }

    Ok(())
}

pub async fn run_context(config: &Config, query: &str, options: SearchOptions) -> anyhow::Result<()> {
    let retriever = Retriever::from_config(config)?;
    let context = retriever.get_relevant_context(query, &options).await?;
    println!("{}", context);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentChunk, Role};

    fn chunk(id: &str, content_type: &str, role: Option<&str>, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: ContentChunk {
                id: id.to_string(),
                title: id.to_string(),
                source_path: format!("{}.md", id),
                chunk_index: 0,
                text: String::new(),
                metadata: ChunkMetadata {
                    content_type: Some(content_type.to_string()),
                    role: role.map(str::to_string),
                    ..ChunkMetadata::default()
                },
            },
            vector,
        }
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.chunk.id.as_str()).collect()
    }

    #[test]
    fn test_rank_sorted_thresholded_truncated() {
        let chunks = vec![
            chunk("low", "guide", None, vec![0.2, 1.0]),
            chunk("best", "guide", None, vec![1.0, 0.0]),
            chunk("mid", "guide", None, vec![1.0, 0.5]),
            chunk("opposite", "guide", None, vec![-1.0, 0.0]),
        ];

        let results = rank(&chunks, &[1.0, 0.0], 10, 0.5, None);
        assert_eq!(ids(&results), vec!["best", "mid"]);
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!(results.iter().all(|r| r.similarity >= 0.5));

        let top1 = rank(&chunks, &[1.0, 0.0], 1, -1.0, None);
        assert_eq!(ids(&top1), vec!["best"]);
    }

    #[test]
    fn test_rank_ties_keep_store_order() {
        let chunks = vec![
            chunk("first", "guide", None, vec![1.0, 0.0]),
            chunk("second", "guide", None, vec![2.0, 0.0]),
            chunk("third", "guide", None, vec![3.0, 0.0]),
        ];
        let results = rank(&chunks, &[1.0, 0.0], 3, 0.0, None);
        assert_eq!(ids(&results), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_filter_is_exact_match() {
        let chunks = vec![
            chunk("qs", "quickstart", Some("server"), vec![1.0, 0.0]),
            chunk("ex", "example", Some("server"), vec![1.0, 0.0]),
            chunk("untyped", "", None, vec![1.0, 0.0]),
        ];
        let filter = MetadataFilter {
            content_type: Some("quickstart".to_string()),
            ..MetadataFilter::default()
        };
        let results = rank(&chunks, &[1.0, 0.0], 10, 0.0, Some(&filter));
        assert_eq!(ids(&results), vec!["qs"]);
        assert!(results
            .iter()
            .all(|r| r.chunk.metadata.content_type.as_deref() == Some("quickstart")));
    }

    #[test]
    fn test_zero_query_vector_scores_zero() {
        let chunks = vec![chunk("a", "guide", None, vec![1.0, 0.0])];
        let results = rank(&chunks, &[0.0, 0.0], 10, 0.0, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].similarity, 0.0);
    }

    #[test]
    fn test_filter_from_intent() {
        let intent = QueryIntent {
            wants_examples: true,
            wants_quickstart: true,
            role: Some(Role::Server),
            language: Some("go".to_string()),
            ..QueryIntent::default()
        };
        let strict = MetadataFilter::from_intent(&intent);
        assert_eq!(strict.content_type.as_deref(), Some("quickstart"));
        assert_eq!(strict.role.as_deref(), Some("server"));
        assert_eq!(strict.language.as_deref(), Some("go"));

        let relaxed = strict.relaxed();
        assert_eq!(relaxed.content_type.as_deref(), Some("quickstart"));
        assert!(relaxed.role.is_none() && relaxed.language.is_none());

        assert!(MetadataFilter::from_intent(&QueryIntent::default()).is_empty());
    }

    #[test]
    fn test_options_validation() {
        let bad_k = SearchOptions {
            top_k: Some(0),
            ..SearchOptions::default()
        };
        assert!(matches!(bad_k.validate(), Err(RagError::InvalidRequest(_))));

        let bad_sim = SearchOptions {
            min_similarity: Some(1.5),
            ..SearchOptions::default()
        };
        assert!(matches!(bad_sim.validate(), Err(RagError::InvalidRequest(_))));

        assert!(SearchOptions::default().validate().is_ok());
    }
}
