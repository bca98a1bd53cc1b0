use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use semsearch_cli::{init_tracing, render_table, validate_query};
use semsearch_core::config::Config;
use semsearch_embed::get_default_embedder;
use semsearch_engine::RetrievalEngine;

/// Nearest-neighbor search over a prebuilt index.
#[derive(Debug, Parser)]
#[command(name = "semsearch-query", version)]
struct Args {
    /// Free-text query.
    query: String,

    /// Number of results (defaults to `search.top_k`).
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Documents file (defaults to `data.documents_path`).
    #[arg(long)]
    documents: Option<PathBuf>,

    /// Index file (defaults to `data.index_path`).
    #[arg(long)]
    index: Option<PathBuf>,

    /// Print results as a JSON array of `{id, text_snippet, score}`.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Config::load()?.settings()?;

    validate_query(&args.query, settings.search.min_query_chars)?;
    let top_k = args.top_k.unwrap_or(settings.search.top_k);
    let documents_path = args.documents.unwrap_or_else(|| settings.data.documents_path());
    let index_path = args.index.unwrap_or_else(|| settings.data.index_path());

    let embedder = get_default_embedder(&settings.model)?;
    let engine = RetrievalEngine::open(Arc::from(embedder), &documents_path, &index_path)?;
    let results = engine.search(&args.query, top_k)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render_table(&args.query, &results));
    }
    Ok(())
}
