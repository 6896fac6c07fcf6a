//! Chunk metadata resolution.
//!
//! The taxonomy is authoritative: when a source path resolves to a catalog
//! item, its fields are copied verbatim. Otherwise metadata is inferred from
//! substrings of the path using the ordered [`PATH_RULES`] table, where the
//! first rule that matches a field wins for that field.

use crate::models::ChunkMetadata;
use crate::taxonomy::TaxonomyIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Language,
    Role,
    Type,
}

/// Ordered `(field, substring, value)` rules applied to `"/" + path`.
pub const PATH_RULES: &[(Field, &str, &str)] = &[
    (Field::Language, "/typescript/", "typescript"),
    (Field::Language, "/go/", "go"),
    (Field::Language, "/python/", "python"),
    (Field::Language, "/java/", "java"),
    (Field::Role, "/client", "client"),
    (Field::Role, "/server", "server"),
    (Field::Role, "/facilitator", "facilitator"),
    (Field::Type, "quickstart", "quickstart"),
    (Field::Type, "/getting-started", "quickstart"),
    (Field::Type, "/examples/", "example"),
    (Field::Type, "/specs/", "spec"),
    (Field::Type, "/docs/", "guide"),
];

/// Infer metadata from path substrings alone.
pub fn infer_from_path(source_path: &str) -> ChunkMetadata {
    let haystack = format!("/{}", source_path.trim_start_matches('/')).to_lowercase();
    let mut meta = ChunkMetadata::default();

    for (field, needle, value) in PATH_RULES {
        if !haystack.contains(needle) {
            continue;
        }
        let slot = match field {
            Field::Language => &mut meta.language,
            Field::Role => &mut meta.role,
            Field::Type => &mut meta.content_type,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    meta
}

/// Resolve metadata for a source path: taxonomy first, heuristics second.
pub fn resolve_metadata(index: &TaxonomyIndex, source_path: &str) -> ChunkMetadata {
    match index.resolve(source_path) {
        Some(item) => ChunkMetadata::from(item),
        None => infer_from_path(source_path),
    }
}
