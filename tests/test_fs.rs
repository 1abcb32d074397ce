use benchtrail::fs::{atomic_write_text, read_json, read_text_if_exists};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_atomic_write_creates_parent_dirs_and_replaces_content() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("dev/bench/data.json");

    // GIVEN a target whose directory does not exist yet
    atomic_write_text(&path, "first").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "first");

    // WHEN it is written again
    atomic_write_text(&path, "second").unwrap();

    // THEN the content is replaced and no temp files are left behind
    assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_read_text_if_exists() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("data.js");

    assert_eq!(read_text_if_exists(&path).unwrap(), None);

    fs::write(&path, "x").unwrap();
    assert_eq!(read_text_if_exists(&path).unwrap().as_deref(), Some("x"));
}

#[test]
fn test_read_json() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("value.json");
    fs::write(&path, "{\"a\": [1, 2]}").unwrap();

    let value: serde_json::Value = read_json(&path).unwrap();

    assert_eq!(value["a"][1], 2);
}
