//! Shared pieces of the `semsearch-indexer` and `semsearch-query` binaries.

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use semsearch_core::documents::DocumentStore;
use semsearch_core::traits::Embedder;
use semsearch_core::types::{Document, SearchResult};
use semsearch_vector::VectorIndex;

/// Installs the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

const BASE_TEXTS: [&str; 10] = [
    "The quick brown fox jumps over the lazy dog.",
    "Artificial intelligence is transforming the world.",
    "Machine learning models require data for training.",
    "Deep learning is a subset of machine learning.",
    "Natural language processing enables computers to understand text.",
    "Computer vision allows machines to see and interpret images.",
    "Reinforcement learning learns from trial and error.",
    "Supervised learning uses labeled datasets.",
    "Unsupervised learning finds patterns in unlabeled data.",
    "Python is a popular programming language for data science.",
];

/// Placeholder corpus for a first run without a documents file:
/// `doc_{i}` cycling through ten base sentences.
pub fn synthetic_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| Document::new(format!("doc_{i}"), format!("{} - Variation {i}", BASE_TEXTS[i % BASE_TEXTS.len()])))
        .collect()
}

/// Loads the documents file, or generates and writes a synthetic one when it
/// does not exist yet.
pub fn load_or_generate_documents(path: &Path, synthetic_count: usize) -> Result<DocumentStore> {
    if path.exists() {
        return Ok(DocumentStore::load(path)?);
    }
    info!(count = synthetic_count, path = %path.display(), "documents file missing; generating synthetic corpus");
    let store = DocumentStore::from_documents(synthetic_documents(synthetic_count))?;
    store.save(path)?;
    Ok(store)
}

pub fn embed_with_progress(embedder: &dyn Embedder, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed_many(batch)?;
        if embedded.len() != batch.len() {
            bail!("embedder returned {} vectors for {} texts", embedded.len(), batch.len());
        }
        vectors.extend(embedded);
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message("embedded");
    Ok(vectors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub documents: usize,
    pub dim: usize,
}

/// Offline build: documents → embeddings → index file. The index rows follow
/// the documents file order exactly.
pub fn build_index(
    embedder: &dyn Embedder,
    documents_path: &Path,
    index_path: &Path,
    synthetic_count: usize,
    batch_size: usize,
) -> Result<BuildReport> {
    let store = load_or_generate_documents(documents_path, synthetic_count)?;
    let vectors = embed_with_progress(embedder, &store.texts(), batch_size)?;
    let index = VectorIndex::build(&vectors)?;
    if index.len() != store.len() {
        bail!("built {} vectors for {} documents", index.len(), store.len());
    }
    index.save(index_path)?;
    Ok(BuildReport { documents: index.len(), dim: index.dim() })
}

/// Caller-side query check applied before the engine is consulted. Counts
/// characters as given, whitespace included.
pub fn validate_query(query: &str, min_chars: usize) -> Result<()> {
    let len = query.chars().count();
    if len == 0 || len < min_chars {
        bail!("Query must not be empty and at least {min_chars} characters long.");
    }
    Ok(())
}

pub fn render_table(query: &str, results: &[SearchResult]) -> String {
    let mut out = format!("Found {} results for: \"{}\"\n", results.len(), query);
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n  {}. score={:.4}  id={}\n     {}\n", i + 1, r.score, r.id, r.text_snippet));
    }
    out
}
