//! Ordered document collection loaded from the ingestion output.
//!
//! Position `i` in the store is the row key shared with the vector index, so
//! the store never reorders, filters or deduplicates what it reads.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{InitError, PositionOutOfRange};
use crate::types::{Document, Position};

/// Wire shape of one record. Both fields are optional here so that a missing
/// field is reported with its position instead of a bare serde message.
#[derive(Debug, Deserialize)]
struct RawDocument {
    id: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    /// Validates ids and wraps the documents in their given order.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, InitError> {
        {
            let mut seen: HashMap<&str, usize> = HashMap::with_capacity(documents.len());
            for (position, doc) in documents.iter().enumerate() {
                if doc.id.is_empty() {
                    return Err(InitError::DocumentsMalformed {
                        path: PathBuf::new(),
                        reason: format!("record {position} has an empty `id`"),
                    });
                }
                if let Some(first) = seen.insert(doc.id.as_str(), position) {
                    return Err(InitError::DuplicateId { id: doc.id.clone(), first, second: position });
                }
            }
        }
        Ok(Self { documents })
    }

    /// Reads a JSON array of `{id, text}` records, or JSON Lines when the
    /// file extension is `jsonl`. Extra fields are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InitError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(InitError::DocumentsNotFound(path.to_path_buf()))
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(malformed(path, format!("not valid UTF-8: {e}")))
            }
            Err(source) => return Err(InitError::Io { path: path.to_path_buf(), source }),
        };

        let records = if is_jsonl(path) { parse_jsonl(path, &raw)? } else { parse_json_array(path, &raw)? };

        let mut documents = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            let id = record.id.ok_or_else(|| malformed(path, format!("record {position} is missing `id`")))?;
            let text = record.text.ok_or_else(|| malformed(path, format!("record {position} is missing `text`")))?;
            documents.push(Document { id, text });
        }

        let store = Self::from_documents(documents).map_err(|e| match e {
            InitError::DocumentsMalformed { reason, .. } => malformed(path, reason),
            other => other,
        })?;
        info!(path = %path.display(), documents = store.len(), "loaded document store");
        Ok(store)
    }

    /// Writes the store as a pretty-printed JSON array, the format `load` reads back.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.documents)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self, position: Position) -> Result<&Document, PositionOutOfRange> {
        self.documents.get(position).ok_or(PositionOutOfRange { position, len: self.documents.len() })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.text.clone()).collect()
    }
}

fn malformed(path: &Path, reason: String) -> InitError {
    InitError::DocumentsMalformed { path: path.to_path_buf(), reason }
}

fn is_jsonl(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("jsonl"))
}

fn parse_json_array(path: &Path, raw: &str) -> Result<Vec<RawDocument>, InitError> {
    serde_json::from_str(raw).map_err(|e| malformed(path, e.to_string()))
}

fn parse_jsonl(path: &Path, raw: &str) -> Result<Vec<RawDocument>, InitError> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            serde_json::from_str(line).map_err(|e| malformed(path, format!("line {}: {e}", line_no + 1)))
        })
        .collect()
}
