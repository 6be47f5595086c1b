//! Repository scenarios: legacy v1 template migration and search.

use iris_recognizer::repository::{JsonStore, Repository};
use std::fs;
use std::path::PathBuf;

fn temp_store(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("iris-repo-{name}-{}.json", std::process::id()))
}

#[test]
fn legacy_v1_record_migrates_and_updates_as_v2() {
    let path = temp_store("legacy");
    fs::write(
        &path,
        r#"[{
            "id": "legacy-1",
            "first_name": "Mary",
            "last_name": "Shelley",
            "email": "mary@example.org",
            "iris_template": "1.0, 0.0, 0.0, 1.0, 1.0, 1.0",
            "created_at": "2023-11-20T08:30:00Z",
            "updated_at": "2023-11-20T08:30:00Z"
        }]"#,
    )
    .expect("seed legacy store");

    let mut store = JsonStore::open(&path).expect("open store");
    let records = store.list_with_templates().expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].iris_templates.len(), 1, "expected singleton migration");
    assert_eq!(
        records[0].iris_templates[0],
        vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]
    );

    // A subsequent update must persist in the v2 column only.
    let mut record = records[0].clone();
    record.notes = Some("migrated".into());
    store.update(record).expect("update");

    let raw = fs::read_to_string(&path).expect("read store file");
    assert!(raw.contains("iris_templates"));
    assert!(!raw.contains("\"iris_template\""));

    let reopened = JsonStore::open(&path).expect("reopen");
    let records = reopened.list_with_templates().expect("list again");
    assert_eq!(records[0].notes.as_deref(), Some("migrated"));

    let _ = fs::remove_file(&path);
}

#[test]
fn search_finds_by_partial_name_and_email() {
    let path = temp_store("search");
    fs::write(
        &path,
        r#"[{
            "id": "s-1",
            "first_name": "Dorothy",
            "last_name": "Vaughan",
            "email": "dvaughan@example.org",
            "iris_templates": [[0.0, 1.0]],
            "created_at": "2024-01-05T12:00:00Z",
            "updated_at": "2024-01-05T12:00:00Z"
        }, {
            "id": "s-2",
            "first_name": "Katherine",
            "last_name": "Johnson",
            "iris_templates": [],
            "created_at": "2024-01-05T12:00:00Z",
            "updated_at": "2024-01-05T12:00:00Z"
        }]"#,
    )
    .expect("seed store");

    let store = JsonStore::open(&path).expect("open");
    assert_eq!(store.search("vaug").expect("search").len(), 1);
    assert_eq!(store.search("johnson").expect("search").len(), 1);
    assert_eq!(store.search("example.org").expect("search").len(), 1);
    assert!(store.search("nobody").expect("search").is_empty());

    // Only s-1 carries templates.
    assert_eq!(store.list_with_templates().expect("list").len(), 1);

    let _ = fs::remove_file(&path);
}
