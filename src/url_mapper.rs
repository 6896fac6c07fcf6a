//! Maps chunk source paths to citable content URLs.
//!
//! `examples/typescript/clients/fetch/README.md` → `/content/ts-client-fetch`.
//! The mapper is built once at startup and shared behind an `Arc`; it holds
//! no interior mutability, so concurrent readers need no locking.

use std::sync::Arc;

use crate::models::TaxonomyItem;
use crate::taxonomy::TaxonomyIndex;

pub struct ContentUrlMapper {
    index: Arc<TaxonomyIndex>,
    url_base: String,
}

impl ContentUrlMapper {
    pub fn new(index: Arc<TaxonomyIndex>, url_base: &str) -> Self {
        Self {
            index,
            url_base: url_base.trim_end_matches('/').to_string(),
        }
    }

    /// A mapper that never resolves anything.
    pub fn empty() -> Self {
        Self::new(Arc::new(TaxonomyIndex::empty()), "/content")
    }

    /// URL for the content item that owns `file_path`, or `None` on a miss.
    pub fn get_content_url(&self, file_path: &str) -> Option<String> {
        self.index
            .resolve_id(file_path)
            .map(|id| format!("{}/{}", self.url_base, id))
    }

    /// Title of the owning content item.
    pub fn get_title(&self, file_path: &str) -> Option<&str> {
        self.get_content_item(file_path)
            .map(|item| item.title.as_str())
            .filter(|title| !title.is_empty())
    }

    pub fn get_content_item(&self, file_path: &str) -> Option<&TaxonomyItem> {
        self.index.resolve(file_path)
    }

    /// Number of items in the backing catalog.
    pub fn catalog_len(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ContentUrlMapper {
        let items = vec![TaxonomyItem {
            id: "ts-client-fetch".to_string(),
            path: "examples/typescript/clients/fetch".to_string(),
            content_type: "example".to_string(),
            role: Some("client".to_string()),
            language: Some("typescript".to_string()),
            framework: Some("fetch".to_string()),
            complexity: None,
            title: "Fetch API Client Example".to_string(),
            description: String::new(),
        }];
        ContentUrlMapper::new(Arc::new(TaxonomyIndex::new(items, "content")), "/content/")
    }

    #[test]
    fn test_get_content_url() {
        let m = mapper();
        assert_eq!(
            m.get_content_url("examples/typescript/clients/fetch/README.md"),
            Some("/content/ts-client-fetch".to_string())
        );
        assert_eq!(m.get_content_url("docs/unknown.md"), None);
    }

    #[test]
    fn test_get_title_and_item() {
        let m = mapper();
        assert_eq!(
            m.get_title("examples/typescript/clients/fetch/client.ts"),
            Some("Fetch API Client Example")
        );
        let item = m
            .get_content_item("/examples/typescript/clients/fetch/")
            .unwrap();
        assert_eq!(item.framework.as_deref(), Some("fetch"));
        assert!(m.get_title("nowhere.md").is_none());
    }

    #[test]
    fn test_empty_mapper_never_resolves() {
        let empty = ContentUrlMapper::empty();
        assert!(empty.get_content_url("a/b.md").is_none());
        assert_eq!(empty.catalog_len(), 0);
    }
}
