//! Prompt-ready rendering of ranked search results.
//!
//! Each result becomes a block headed by `[Source n: title (...)]`, then a
//! citation line when the source path maps to a content item, then the
//! chunk text. Blocks are separated by a horizontal rule.

use crate::models::SearchResult;
use crate::url_mapper::ContentUrlMapper;

/// Returned instead of an empty string when nothing was retrieved.
pub const NO_CONTEXT: &str = "No relevant content found in the documentation.";

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

pub fn build_context(results: &[SearchResult], mapper: &ContentUrlMapper) -> String {
    if results.is_empty() {
        return NO_CONTEXT.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| render_block(i + 1, result, mapper))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn render_block(n: usize, result: &SearchResult, mapper: &ContentUrlMapper) -> String {
    let chunk = &result.chunk;
    let meta = &chunk.metadata;

    let attrs: Vec<String> = [
        ("Role", &meta.role),
        ("Language", &meta.language),
        ("Type", &meta.content_type),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
    .collect();

    let mut block = if attrs.is_empty() {
        format!("[Source {}: {}]\n", n, chunk.title)
    } else {
        format!("[Source {}: {} ({})]\n", n, chunk.title, attrs.join(", "))
    };

    if let Some(url) = mapper.get_content_url(&chunk.source_path) {
        let title = mapper.get_title(&chunk.source_path).unwrap_or(&chunk.title);
        let label = if meta.content_type.as_deref() == Some("example") {
            "Full example"
        } else {
            "Read more"
        };
        block.push_str(&format!("{}: {} - {}\n", label, title, url));
    }

    block.push_str(&chunk.text);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChunkMetadata, ContentChunk, TaxonomyItem};
    use crate::taxonomy::TaxonomyIndex;
    use std::sync::Arc;

    fn result(path: &str, metadata: ChunkMetadata, text: &str) -> SearchResult {
        SearchResult {
            chunk: ContentChunk {
                id: "c".to_string(),
                title: "Chunk Title".to_string(),
                source_path: path.to_string(),
                chunk_index: 0,
                text: text.to_string(),
                metadata,
            },
            similarity: 0.9,
        }
    }

    fn mapper() -> ContentUrlMapper {
        let items = vec![
            TaxonomyItem {
                id: "ts-client-fetch".to_string(),
                path: "examples/typescript/clients/fetch".to_string(),
                content_type: "example".to_string(),
                role: Some("client".to_string()),
                language: Some("typescript".to_string()),
                framework: Some("fetch".to_string()),
                complexity: None,
                title: "Fetch Client".to_string(),
                description: String::new(),
            },
            TaxonomyItem {
                id: "http-402".to_string(),
                path: "docs/core-concepts/http-402.md".to_string(),
                content_type: "guide".to_string(),
                role: None,
                language: None,
                framework: None,
                complexity: None,
                title: String::new(),
                description: String::new(),
            },
        ];
        ContentUrlMapper::new(Arc::new(TaxonomyIndex::new(items, "content")), "/content")
    }

    #[test]
    fn test_empty_results_sentinel() {
        assert_eq!(build_context(&[], &mapper()), NO_CONTEXT);
    }

    #[test]
    fn test_example_block_with_citation() {
        let meta = ChunkMetadata {
            content_type: Some("example".to_string()),
            role: Some("client".to_string()),
            language: Some("typescript".to_string()),
            ..ChunkMetadata::default()
        };
        let out = build_context(
            &[result("examples/typescript/clients/fetch/README.md", meta, "npm install")],
            &mapper(),
        );
        assert_eq!(
            out,
            "[Source 1: Chunk Title (Role: client, Language: typescript, Type: example)]\n\
             Full example: Fetch Client - /content/ts-client-fetch\n\
             npm install"
        );
    }

    #[test]
    fn test_read_more_falls_back_to_chunk_title() {
        let meta = ChunkMetadata {
            content_type: Some("guide".to_string()),
            ..ChunkMetadata::default()
        };
        let out = build_context(
            &[result("docs/core-concepts/http-402.md", meta, "body")],
            &mapper(),
        );
        assert!(out.starts_with("[Source 1: Chunk Title (Type: guide)]\n"));
        assert!(out.contains("Read more: Chunk Title - /content/http-402\n"));
    }

    #[test]
    fn test_unmapped_omits_citation_and_joins_blocks() {
        let results = vec![
            result("notes/a.md", ChunkMetadata::default(), "first"),
            result("notes/b.md", ChunkMetadata::default(), "second"),
        ];
        let out = build_context(&results, &mapper());
        assert_eq!(
            out,
            "[Source 1: Chunk Title]\nfirst\n\n---\n\n[Source 2: Chunk Title]\nsecond"
        );
    }
}
