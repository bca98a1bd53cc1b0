use std::fs;
use tempfile::TempDir;

use semsearch_core::documents::DocumentStore;
use semsearch_core::error::{InitError, PositionOutOfRange};
use semsearch_core::types::Document;

#[test]
fn load_keeps_file_order_and_ignores_extra_fields() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.json");
    fs::write(
        &path,
        r#"[
            {"id": "b", "text": "goodbye", "lang": "en"},
            {"id": "a", "text": "hello world"}
        ]"#,
    )
    .unwrap();

    let store = DocumentStore::load(&path).expect("load");
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(0).unwrap(), &Document::new("b", "goodbye"));
    assert_eq!(store.get(1).unwrap().id, "a");
}

#[test]
fn load_missing_file_is_documents_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = DocumentStore::load(tmp.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, InitError::DocumentsNotFound(_)), "got {err:?}");
}

#[test]
fn load_record_without_text_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.json");
    fs::write(&path, r#"[{"id": "a", "text": "x"}, {"id": "b"}]"#).unwrap();

    match DocumentStore::load(&path).unwrap_err() {
        InitError::DocumentsMalformed { reason, path: p } => {
            assert!(reason.contains("record 1"), "reason names the record: {reason}");
            assert!(reason.contains("text"));
            assert_eq!(p, path);
        }
        other => panic!("expected DocumentsMalformed, got {other:?}"),
    }
}

#[test]
fn load_record_without_id_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.json");
    fs::write(&path, r#"[{"text": "orphan"}]"#).unwrap();
    assert!(matches!(DocumentStore::load(&path).unwrap_err(), InitError::DocumentsMalformed { .. }));
}

#[test]
fn load_invalid_json_is_malformed() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.json");
    fs::write(&path, r#"{"id": "a", "text": "not an array"}"#).unwrap();
    assert!(matches!(DocumentStore::load(&path).unwrap_err(), InitError::DocumentsMalformed { .. }));
}

#[test]
fn load_rejects_duplicate_ids() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.json");
    fs::write(&path, r#"[{"id": "a", "text": "1"}, {"id": "b", "text": "2"}, {"id": "a", "text": "3"}]"#).unwrap();

    match DocumentStore::load(&path).unwrap_err() {
        InitError::DuplicateId { id, first, second } => {
            assert_eq!(id, "a");
            assert_eq!((first, second), (0, 2));
        }
        other => panic!("expected DuplicateId, got {other:?}"),
    }
}

#[test]
fn empty_id_is_malformed() {
    let err = DocumentStore::from_documents(vec![Document::new("", "text")]).unwrap_err();
    assert!(matches!(err, InitError::DocumentsMalformed { .. }));
}

#[test]
fn load_jsonl_skips_blank_lines() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.jsonl");
    fs::write(&path, "{\"id\": \"a\", \"text\": \"one\"}\n\n{\"id\": \"b\", \"text\": \"two\"}\n").unwrap();

    let store = DocumentStore::load(&path).expect("load jsonl");
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(1).unwrap().text, "two");
}

#[test]
fn load_empty_array_gives_empty_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("documents.json");
    fs::write(&path, "[]").unwrap();
    let store = DocumentStore::load(&path).unwrap();
    assert!(store.is_empty());
}

#[test]
fn get_out_of_range_reports_position_and_len() {
    let store = DocumentStore::from_documents(vec![Document::new("a", "x")]).unwrap();
    assert_eq!(store.get(1).unwrap_err(), PositionOutOfRange { position: 1, len: 1 });
    assert_eq!(store.get(usize::MAX).unwrap_err().len, 1);
}

#[test]
fn save_then_load_preserves_documents() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/dir/documents.json");
    let docs = vec![Document::new("doc_0", "first"), Document::new("doc_1", "second ✓")];
    let store = DocumentStore::from_documents(docs.clone()).unwrap();
    store.save(&path).expect("save");

    let loaded = DocumentStore::load(&path).expect("load");
    let back: Vec<Document> = loaded.iter().cloned().collect();
    assert_eq!(back, docs);
    assert_eq!(loaded.texts(), vec!["first".to_string(), "second ✓".to_string()]);
}
