//! Filesystem source scanner.
//!
//! Walks every configured ingest root, applies include/exclude globs to the
//! path relative to the root, and reads matching files. Unreadable and
//! empty files, and entries the walker cannot read (dangling symlinks,
//! unreadable directories) are skipped with a warning. Only a missing root
//! or an invalid glob fails the scan.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{IngestConfig, IngestRoot};
use crate::error::{RagError, Result};
use crate::taxonomy::normalize_path;

/// A text file read from a source tree.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// `/`-separated path relative to its root, with the root's prefix applied.
    pub source_path: String,
    pub title: String,
    pub body: String,
}

/// Scan all roots, returning files sorted by source path.
pub fn scan_roots(config: &IngestConfig) -> Result<Vec<SourceFile>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    for root in &config.roots {
        scan_root(
            root,
            &include_set,
            &exclude_set,
            config.follow_symlinks,
            &mut files,
        )?;
    }

    files.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    Ok(files)
}

fn scan_root(
    root: &IngestRoot,
    include_set: &GlobSet,
    exclude_set: &GlobSet,
    follow_symlinks: bool,
    files: &mut Vec<SourceFile>,
) -> Result<()> {
    if !root.path.is_dir() {
        return Err(RagError::Ingestion(format!(
            "ingest root does not exist or is not a directory: {}",
            root.path.display()
        )));
    }

    let walker = WalkDir::new(&root.path).follow_links(follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&root.path).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        if body.trim().is_empty() {
            warn!(path = %path.display(), "skipping empty file");
            continue;
        }

        let source_path = match root.prefix.as_deref().map(normalize_path) {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, rel_str),
            _ => rel_str,
        };

        files.push(SourceFile {
            title: extract_title(&body, path),
            source_path,
            body,
        });
    }

    Ok(())
}

/// First Markdown `# ` heading, else the file stem.
pub fn extract_title(body: &str, path: &Path) -> String {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| RagError::Ingestion(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RagError::Ingestion(format!("invalid glob set: {}", e)))
}
