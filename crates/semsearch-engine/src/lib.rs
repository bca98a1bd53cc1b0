//! Query-time retrieval: embed the query, scan the vector index, join hits
//! back to the document store by position.
//!
//! The engine is built once, initialized once, then shared read-only (for
//! example behind an `Arc`) by any number of concurrent callers.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use semsearch_core::documents::DocumentStore;
use semsearch_core::error::{IndexError, InitError, SearchError};
use semsearch_core::traits::Embedder;
use semsearch_core::types::SearchResult;
use semsearch_vector::{Neighbor, VectorIndex};
use tracing::{debug, error, info};

/// Maximum snippet length, in characters.
pub const SNIPPET_CHARS: usize = 200;

/// First `max_chars` characters of `text`, or all of it when shorter.
pub fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

struct Corpus {
    documents: DocumentStore,
    index: VectorIndex,
}

enum EngineState {
    Uninitialized,
    Ready(Corpus),
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    state: EngineState,
}

impl RetrievalEngine {
    /// A fresh engine in the `Uninitialized` state.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, state: EngineState::Uninitialized }
    }

    /// `new` followed by `initialize`.
    pub fn open(
        embedder: Arc<dyn Embedder>,
        documents_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
    ) -> Result<Self, InitError> {
        let mut engine = Self::new(embedder);
        engine.initialize(documents_path, index_path)?;
        Ok(engine)
    }

    /// Loads both data files and moves the engine to `Ready`. There is no way
    /// back: a second call fails with `AlreadyInitialized`.
    pub fn initialize(&mut self, documents_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<(), InitError> {
        if self.is_ready() {
            return Err(InitError::AlreadyInitialized);
        }
        let documents = DocumentStore::load(documents_path)?;
        let index = VectorIndex::load(index_path)?;
        self.install(documents, index)
    }

    /// Same as `initialize` for data that is already in memory.
    pub fn initialize_with(&mut self, documents: DocumentStore, index: VectorIndex) -> Result<(), InitError> {
        if self.is_ready() {
            return Err(InitError::AlreadyInitialized);
        }
        self.install(documents, index)
    }

    fn install(&mut self, documents: DocumentStore, index: VectorIndex) -> Result<(), InitError> {
        if documents.len() != index.len() {
            return Err(InitError::LengthMismatch { documents: documents.len(), vectors: index.len() });
        }
        if !index.is_empty() && self.embedder.dim() != index.dim() {
            return Err(InitError::DimensionMismatch { expected: index.dim(), actual: self.embedder.dim() });
        }
        info!(documents = documents.len(), dim = index.dim(), "retrieval engine ready");
        self.state = EngineState::Ready(Corpus { documents, index });
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Number of searchable documents; zero before initialization.
    pub fn len(&self) -> usize {
        match &self.state {
            EngineState::Ready(corpus) => corpus.documents.len(),
            EngineState::Uninitialized => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index dimension once ready.
    pub fn dimension(&self) -> Option<usize> {
        match &self.state {
            EngineState::Ready(corpus) => Some(corpus.index.dim()),
            EngineState::Uninitialized => None,
        }
    }

    /// Top-`top_k` documents closest to `query_text`, nearest first.
    ///
    /// `score` is the squared L2 distance, unmodified. Either every hit
    /// resolves to a document or the whole search fails.
    pub fn search(&self, query_text: &str, top_k: usize) -> Result<Vec<SearchResult>, SearchError> {
        if top_k == 0 {
            return Err(SearchError::InvalidTopK(top_k));
        }
        let EngineState::Ready(corpus) = &self.state else {
            return Err(SearchError::EngineNotReady);
        };

        let start = Instant::now();
        let query_vector = self
            .embedder
            .embed(query_text)
            .map_err(|e| SearchError::EmbeddingFailed(format!("{e:#}")))?;
        let hits = corpus.index.search(&query_vector, top_k).map_err(|e| match e {
            IndexError::DimensionMismatch { expected, actual } => SearchError::EmbeddingFailed(format!(
                "provider returned a {actual}-dimensional vector, index expects {expected}"
            )),
            other => SearchError::EmbeddingFailed(other.to_string()),
        })?;

        let results = hits
            .iter()
            .map(|hit| to_result(&corpus.documents, hit))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(top_k, hits = results.len(), elapsed_ms = start.elapsed().as_millis(), "search");
        Ok(results)
    }
}

fn to_result(documents: &DocumentStore, hit: &Neighbor) -> Result<SearchResult, SearchError> {
    let doc = documents.get(hit.position).map_err(|e| {
        error!(position = e.position, store_len = e.len, "vector index and document store are out of sync");
        SearchError::IndexStoreMismatch { position: e.position, store_len: e.len }
    })?;
    Ok(SearchResult {
        id: doc.id.clone(),
        text_snippet: snippet(&doc.text, SNIPPET_CHARS).to_string(),
        score: hit.distance,
    })
}
