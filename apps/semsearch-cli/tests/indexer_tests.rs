use std::sync::Arc;

use semsearch_cli::{build_index, BuildReport};
use semsearch_core::documents::DocumentStore;
use semsearch_core::traits::Embedder;
use semsearch_core::types::Document;
use semsearch_embed::FakeEmbedder;
use semsearch_engine::RetrievalEngine;
use tempfile::TempDir;

#[test]
fn first_run_generates_corpus_and_index_that_serve_together() {
    let tmp = TempDir::new().unwrap();
    let docs_path = tmp.path().join("data/documents.json");
    let index_path = tmp.path().join("data/vector_index.bin");
    let embedder = FakeEmbedder::new(32);

    let report = build_index(&embedder, &docs_path, &index_path, 25, 8).expect("build");
    assert_eq!(report, BuildReport { documents: 25, dim: 32 });
    assert!(docs_path.exists());

    let engine = RetrievalEngine::open(Arc::new(embedder), &docs_path, &index_path).unwrap();
    let results = engine.search("Supervised learning uses labeled datasets. - Variation 17", 3).unwrap();
    assert_eq!(results[0].id, "doc_17");
    assert_eq!(results[0].score, 0.0);
}

#[test]
fn existing_documents_file_is_used_as_is() {
    let tmp = TempDir::new().unwrap();
    let docs_path = tmp.path().join("documents.json");
    let index_path = tmp.path().join("vector_index.bin");
    DocumentStore::from_documents(vec![Document::new("x", "alpha beta"), Document::new("y", "gamma delta")])
        .unwrap()
        .save(&docs_path)
        .unwrap();

    let embedder = FakeEmbedder::new(16);
    let report = build_index(&embedder, &docs_path, &index_path, 1000, 1).unwrap();
    assert_eq!(report.documents, 2);

    let engine = RetrievalEngine::open(Arc::new(FakeEmbedder::new(16)), &docs_path, &index_path).unwrap();
    assert_eq!(engine.len(), 2);
    assert_eq!(engine.search("gamma delta", 1).unwrap()[0].id, "y");
    assert_eq!(embedder.dim(), 16);
}

#[test]
fn zero_batch_size_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let embedder = FakeEmbedder::new(4);
    let result = build_index(&embedder, &tmp.path().join("d.json"), &tmp.path().join("i.bin"), 3, 0);
    assert!(result.is_err());
}
