//! Ingestion pipeline orchestration.
//!
//! Runs the offline batch end to end: scan roots → chunk → attach metadata
//! → embed → atomically replace the vector store. Any failure aborts before
//! the store is written, so the previous store survives a bad run.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::chunk::split_into_chunks;
use crate::config::Config;
use crate::connector_fs::{self, SourceFile};
use crate::embed_cmd::embed_chunks;
use crate::embedding::create_provider;
use crate::metadata::resolve_metadata;
use crate::models::ContentChunk;
use crate::store::VectorStore;
use crate::taxonomy::{load_catalog, TaxonomyIndex};

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    if config.ingest.roots.is_empty() {
        bail!("No [[ingest.roots]] configured. Add at least one source directory to the config.");
    }

    let index = load_index(config)?;
    if index.is_empty() {
        info!("taxonomy catalog is empty; metadata comes from path heuristics only");
    }
    let files = connector_fs::scan_roots(&config.ingest)?;
    let chunks = build_chunks(&files, &index, config.ingest.max_chunk_size);
    let taxonomy_hits = files
        .iter()
        .filter(|f| index.resolve(&f.source_path).is_some())
        .count();

    info!(
        files = files.len(),
        chunks = chunks.len(),
        taxonomy_items = index.len(),
        taxonomy_hits,
        "scanned sources"
    );

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files found: {}", files.len());
        println!("  taxonomy matches: {}", taxonomy_hits);
        println!("  chunks: {}", chunks.len());
        return Ok(());
    }

    let provider = create_provider(&config.embedding)?;
    let chunk_count = chunks.len();
    let embedded = embed_chunks(provider.as_ref(), chunks, config.embedding.batch_size)
        .await
        .context("embedding failed; the existing store was left untouched")?;

    let store = VectorStore::new(provider.model_name(), provider.dims(), embedded)?;
    store.save(&config.store.path)?;

    println!("ingest");
    println!("  files: {}", files.len());
    println!("  taxonomy matches: {}", taxonomy_hits);
    println!("  chunks embedded: {}", chunk_count);
    println!("  model: {} ({} dims)", store.model(), store.dims());
    println!("  store: {}", config.store.path.display());
    println!("ok");

    Ok(())
}

fn load_index(config: &Config) -> Result<Arc<TaxonomyIndex>> {
    let index = match &config.taxonomy.path {
        Some(path) => {
            let items = load_catalog(path)
                .with_context(|| format!("failed to load taxonomy {}", path.display()))?;
            TaxonomyIndex::new(items, &config.taxonomy.content_prefix)
        }
        None => TaxonomyIndex::empty(),
    };
    Ok(Arc::new(index))
}

/// Split every file into chunks with ids, part titles and metadata.
pub fn build_chunks(files: &[SourceFile], index: &TaxonomyIndex, max_chunk_size: usize) -> Vec<ContentChunk> {
    let mut chunks = Vec::new();

    for file in files {
        let metadata = resolve_metadata(index, &file.source_path);
        let base_id = chunk_id_base(&file.source_path);

        for (i, text) in split_into_chunks(&file.body, max_chunk_size)
            .into_iter()
            .enumerate()
        {
            let title = if i == 0 {
                file.title.clone()
            } else {
                format!("{} (part {})", file.title, i + 1)
            };
            chunks.push(ContentChunk {
                id: format!("{}_chunk_{}", base_id, i),
                title,
                source_path: file.source_path.clone(),
                chunk_index: i,
                text,
                metadata: metadata.clone(),
            });
        }
    }

    chunks
}

/// `docs/guides/setup.md` → `docs_guides_setup`.
fn chunk_id_base(source_path: &str) -> String {
    let (dir, file) = match source_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, source_path),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    match dir {
        Some(dir) => format!("{}_{}", dir.replace('/', "_"), stem),
        None => stem.to_string(),
    }
}
