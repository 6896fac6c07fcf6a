//! Static taxonomy catalog and its path index.
//!
//! The catalog is a JSON file owned by content authors. It is either a bare
//! array of [`TaxonomyItem`]s or an object whose `content_map` field holds
//! that array (other top-level keys are ignored).
//!
//! [`TaxonomyIndex`] registers several spellings of every item path so that
//! file paths found during ingestion resolve to the item that owns them:
//!
//! | Variant | `examples/ts/fetch` registers |
//! |---------|-------------------------------|
//! | raw | `examples/ts/fetch` |
//! | normalized | slashes trimmed and collapsed |
//! | prefix toggled | `content/examples/ts/fetch` |
//! | trailing slash | `examples/ts/fetch/` |
//! | directory readme | `examples/ts/fetch/README.md` |
//!
//! Variants never overwrite an earlier registration, so each spelling maps
//! to exactly one id: the first catalog item that claimed it.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{RagError, Result};
use crate::models::TaxonomyItem;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { content_map: Vec<TaxonomyItem> },
    Bare(Vec<TaxonomyItem>),
}

/// Read and validate a taxonomy catalog from disk.
pub fn load_catalog(path: &Path) -> Result<Vec<TaxonomyItem>> {
    let content = std::fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
    parse_catalog(&content)
}

/// Parse and validate catalog JSON.
///
/// Entries with an empty `id` or `path`, and duplicate ids, are rejected.
pub fn parse_catalog(json: &str) -> Result<Vec<TaxonomyItem>> {
    let file: CatalogFile = serde_json::from_str(json)
        .map_err(|e| RagError::Ingestion(format!("malformed taxonomy catalog: {}", e)))?;
    let items = match file {
        CatalogFile::Wrapped { content_map } => content_map,
        CatalogFile::Bare(items) => items,
    };

    let mut seen = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(RagError::Ingestion(format!(
                "taxonomy entry {} has an empty id",
                i
            )));
        }
        if item.path.trim().is_empty() {
            return Err(RagError::Ingestion(format!(
                "taxonomy entry '{}' has an empty path",
                item.id
            )));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(RagError::Ingestion(format!(
                "duplicate taxonomy id '{}'",
                item.id
            )));
        }
    }

    Ok(items)
}

/// Strip leading/trailing slashes and collapse internal slash runs.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// The path with its last segment removed (`a/b/c.md` → `a/b`).
pub fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

fn is_directory_like(path: &str) -> bool {
    let normalized = normalize_path(path);
    match normalized.rsplit('/').next() {
        Some(last) => !last.contains('.'),
        None => false,
    }
}

/// Immutable path→item index built once from the catalog.
#[derive(Debug, Default)]
pub struct TaxonomyIndex {
    path_to_id: HashMap<String, String>,
    items: HashMap<String, TaxonomyItem>,
    content_prefix: String,
}

impl TaxonomyIndex {
    /// Build the index. `content_prefix` is the optional leading directory
    /// (e.g. `content`) that catalog paths may or may not carry.
    pub fn new(items: Vec<TaxonomyItem>, content_prefix: &str) -> Self {
        let mut index = Self {
            path_to_id: HashMap::new(),
            items: HashMap::new(),
            content_prefix: normalize_path(content_prefix),
        };
        for item in items {
            index.register(item);
        }
        index
    }

    /// An index with no entries; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    fn register(&mut self, item: TaxonomyItem) {
        let id = item.id.clone();
        let normalized = normalize_path(&item.path);

        let mut variants = vec![item.path.clone(), normalized.clone()];
        if let Some(toggled) = self.toggle_prefix(&normalized) {
            variants.push(toggled.clone());
            variants.push(format!("{}/", toggled));
        }
        variants.push(format!("{}/", normalized));

        if is_directory_like(&item.path) {
            let readmes: Vec<String> = variants
                .iter()
                .map(|v| format!("{}/README.md", v.trim_end_matches('/')))
                .collect();
            variants.extend(readmes);
        }

        for variant in variants {
            self.path_to_id.entry(variant).or_insert_with(|| id.clone());
        }
        self.items.entry(id).or_insert(item);
    }

    fn toggle_prefix(&self, normalized: &str) -> Option<String> {
        if self.content_prefix.is_empty() {
            return None;
        }
        let with_slash = format!("{}/", self.content_prefix);
        match normalized.strip_prefix(&with_slash) {
            Some(stripped) => Some(stripped.to_string()),
            None => Some(format!("{}{}", with_slash, normalized)),
        }
    }

    /// Resolve a file path to the id of the item that owns it.
    ///
    /// Tries, in order: exact, normalized, directory of the file (for
    /// multi-file examples), and normalized directory.
    pub fn resolve_id(&self, file_path: &str) -> Option<&str> {
        let normalized = normalize_path(file_path);
        let dir = directory_of(file_path);
        let candidates = [
            file_path.to_string(),
            normalized,
            dir.to_string(),
            normalize_path(dir),
        ];

        candidates
            .iter()
            .filter(|c| !c.is_empty())
            .find_map(|c| self.path_to_id.get(c.as_str()))
            .map(|id| id.as_str())
    }

    /// Resolve a file path to its catalog item.
    pub fn resolve(&self, file_path: &str) -> Option<&TaxonomyItem> {
        self.resolve_id(file_path).and_then(|id| self.items.get(id))
    }

    /// Number of catalog items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, path: &str, content_type: &str) -> TaxonomyItem {
        TaxonomyItem {
            id: id.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            role: None,
            language: None,
            framework: None,
            complexity: None,
            title: format!("Title {}", id),
            description: String::new(),
        }
    }

    fn index() -> TaxonomyIndex {
        TaxonomyIndex::new(
            vec![
                item("ts-client-fetch", "examples/typescript/clients/fetch", "example"),
                item("guide-miniapps", "content/docs/guides/miniapps.md", "guide"),
                item("spec-core", "/specs//x402-specification.md/", "spec"),
            ],
            "content",
        )
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a//b/c/"), "a/b/c");
        assert_eq!(normalize_path("a/b"), "a/b");
        assert_eq!(normalize_path("///"), "");
    }

    #[test]
    fn test_directory_of() {
        assert_eq!(directory_of("a/b/c.md"), "a/b");
        assert_eq!(directory_of("c.md"), "");
    }

    #[test]
    fn test_resolve_exact_and_readme() {
        let idx = index();
        assert_eq!(
            idx.resolve_id("examples/typescript/clients/fetch"),
            Some("ts-client-fetch")
        );
        assert_eq!(
            idx.resolve_id("examples/typescript/clients/fetch/README.md"),
            Some("ts-client-fetch")
        );
    }

    #[test]
    fn test_resolve_directory_of_file() {
        let idx = index();
        assert_eq!(
            idx.resolve_id("examples/typescript/clients/fetch/src/index.ts"),
            None
        );
        assert_eq!(
            idx.resolve_id("examples/typescript/clients/fetch/index.ts"),
            Some("ts-client-fetch")
        );
    }

    #[test]
    fn test_resolve_prefix_toggled() {
        let idx = index();
        assert_eq!(
            idx.resolve_id("docs/guides/miniapps.md"),
            Some("guide-miniapps")
        );
        assert_eq!(
            idx.resolve_id("content/examples/typescript/clients/fetch/README.md"),
            Some("ts-client-fetch")
        );
    }

    #[test]
    fn test_resolve_normalized() {
        let idx = index();
        assert_eq!(
            idx.resolve_id("//specs/x402-specification.md"),
            Some("spec-core")
        );
    }

    #[test]
    fn test_resolve_miss() {
        let idx = index();
        assert_eq!(idx.resolve_id("unknown/file.md"), None);
        assert_eq!(idx.resolve_id("README.md"), None);
        assert!(TaxonomyIndex::empty().resolve("anything").is_none());
        assert!(TaxonomyIndex::empty().is_empty());
        assert_eq!(idx.len(), 3);
    }

    #[test]
    fn test_first_claim_wins() {
        let idx = TaxonomyIndex::new(
            vec![item("first", "docs/a", "guide"), item("second", "/docs/a/", "guide")],
            "content",
        );
        assert_eq!(idx.resolve_id("docs/a"), Some("first"));
        assert_eq!(idx.resolve_id("/docs/a/"), Some("second"));
    }

    #[test]
    fn test_parse_wrapped_and_bare() {
        let wrapped = r#"{"metadata": {"version": "1"}, "content_map": [
            {"id": "a", "path": "docs/a.md", "type": "guide", "title": "A", "description": "d"}
        ]}"#;
        let items = parse_catalog(wrapped).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content_type, "guide");

        let bare = r#"[{"id": "b", "path": "docs/b.md", "type": "concept", "role": "server"}]"#;
        let items = parse_catalog(bare).unwrap();
        assert_eq!(items[0].role.as_deref(), Some("server"));
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        let empty_id = r#"[{"id": "", "path": "docs/a.md", "type": "guide"}]"#;
        assert!(matches!(parse_catalog(empty_id), Err(RagError::Ingestion(_))));

        let dup = r#"[{"id": "a", "path": "x", "type": "guide"}, {"id": "a", "path": "y", "type": "guide"}]"#;
        assert!(matches!(parse_catalog(dup), Err(RagError::Ingestion(_))));

        assert!(matches!(parse_catalog("{not json"), Err(RagError::Ingestion(_))));
    }
}
