use std::path::PathBuf;

use clap::Parser;
use semsearch_cli::{build_index, init_tracing};
use semsearch_core::config::Config;
use semsearch_embed::get_default_embedder;

/// Embed the document collection and write the vector index next to it.
#[derive(Debug, Parser)]
#[command(name = "semsearch-indexer", version)]
struct Args {
    /// Documents file (defaults to `data.documents_path`).
    #[arg(long)]
    documents: Option<PathBuf>,

    /// Output index file (defaults to `data.index_path`).
    #[arg(long)]
    index: Option<PathBuf>,

    /// Number of synthetic documents to generate when the documents file is missing.
    #[arg(long, default_value_t = 1000)]
    synthetic: usize,

    /// Texts per embedding batch.
    #[arg(long, default_value_t = 64)]
    batch_size: usize,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Config::load()?.settings()?;

    let documents_path = args.documents.unwrap_or_else(|| settings.data.documents_path());
    let index_path = args.index.unwrap_or_else(|| settings.data.index_path());

    println!("semsearch indexer\n=================");
    println!("Documents: {}", documents_path.display());
    println!("Index:     {}", index_path.display());

    let embedder = get_default_embedder(&settings.model)?;
    let report = build_index(embedder.as_ref(), &documents_path, &index_path, args.synthetic, args.batch_size)?;

    println!("\nIndex contains {} vectors of dimension {}.", report.documents, report.dim);
    println!("Done.");
    Ok(())
}
