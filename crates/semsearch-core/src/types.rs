//! Domain types shared by the document store, the vector index and the engine.

use serde::{Deserialize, Serialize};

pub type DocumentId = String;

/// Row number shared by the document store and the vector index.
pub type Position = usize;

/// A source document as produced by the offline ingestion step.
///
/// - `id`: stable, non-empty, unique within a store
/// - `text`: the full text payload that was embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// One ranked hit returned to callers.
///
/// `score` is the raw squared L2 distance reported by the index: lower is
/// better and it is never normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: DocumentId,
    pub text_snippet: String,
    pub score: f32,
}
