use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while building, loading or querying a vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vectors must have at least one component")]
    ZeroDimension,

    #[error("vector index file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("vector index file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on vector index file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Startup failures. All of them are fatal and need an operator to fix the
/// data files before restarting.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("documents file not found: {}", .0.display())]
    DocumentsNotFound(PathBuf),

    #[error("documents file {} is malformed: {reason}", .path.display())]
    DocumentsMalformed { path: PathBuf, reason: String },

    #[error("duplicate document id '{id}' at positions {first} and {second}")]
    DuplicateId { id: String, first: usize, second: usize },

    #[error("vector index file not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("vector index file {} is corrupt: {reason}", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector index has zero-dimensional vectors")]
    ZeroDimension,

    #[error("document store holds {documents} documents but vector index holds {vectors} vectors")]
    LengthMismatch { documents: usize, vectors: usize },

    #[error("engine is already initialized")]
    AlreadyInitialized,

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<IndexError> for InitError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { expected, actual } => InitError::DimensionMismatch { expected, actual },
            IndexError::ZeroDimension => InitError::ZeroDimension,
            IndexError::NotFound(path) => InitError::IndexNotFound(path),
            IndexError::Corrupt { path, reason } => InitError::IndexCorrupt { path, reason },
            IndexError::Io { path, source } => InitError::Io { path, source },
        }
    }
}

/// Per-query failures. A failed search never carries partial results.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),

    #[error("embedding the query failed: {0}")]
    EmbeddingFailed(String),

    #[error("engine is not ready; initialize it before searching")]
    EngineNotReady,

    #[error("index returned position {position} but the document store holds {store_len} documents; the index and document files are out of sync")]
    IndexStoreMismatch { position: usize, store_len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("position {position} is out of range for a store of {len} documents")]
pub struct PositionOutOfRange {
    pub position: usize,
    pub len: usize,
}
