//! Integration tests for the edit workflow

use lbrkit::prelude::*;
use lbrkit::{get_existing_deviceset, summarize_deviceset};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy a fixture into a temp dir so it can be edited in place.
fn scratch_copy(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    std::fs::copy(fixture_path(name), &target).expect("copy fixture");
    target
}

fn resistor_request(name: &str, parts: Vec<PartEntry>) -> EditRequest {
    EditRequest {
        name: name.to_string(),
        prefix: Some("R".to_string()),
        value: "10k".to_string(),
        symbol: None,
        parts,
    }
}

#[test]
fn test_apply_creates_then_merges() {
    let mut doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    let options = EditOptions::default();

    let created = LibraryEditor::apply(
        &mut doc,
        &resistor_request("10K", vec![PartEntry::new("0402", "10k resistor", "C25744")]),
        &options,
    )
    .expect("Should create deviceset");
    assert_eq!(created.action, EditAction::Created);
    assert_eq!(created.added, 1);

    let merged = LibraryEditor::apply(
        &mut doc,
        &resistor_request(
            "10k",
            vec![
                PartEntry::new("0402", "10k resistor", "C25744"),
                PartEntry::new("0603", "10k resistor", "C25804"),
                PartEntry::new("0805", "", "C17414"),
            ],
        ),
        &options,
    )
    .expect("Should merge into existing deviceset");
    assert_eq!(merged.action, EditAction::Merged);
    assert_eq!(merged.deviceset, "10K");
    assert_eq!((merged.updated, merged.added), (1, 1));
    assert_eq!(merged.skipped, vec!["0805"]);

    let summary = summarize_deviceset(get_existing_deviceset(&doc, "10K").unwrap());
    assert_eq!(summary.prefix.as_deref(), Some("R"));
    assert!(summary.uservalue);
    assert_eq!(summary.symbols, vec!["R-US"]);
    assert_eq!(summary.devices.len(), 2);
    assert!(summary.devices.iter().all(|d| d.value.as_deref() == Some("10k")));
}

#[test]
fn test_apply_sets_symbol_on_existing() {
    let mut doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    let mut request = EditRequest {
        name: "100NF".to_string(),
        prefix: None,
        value: "100nF".to_string(),
        symbol: Some("R-US".to_string()),
        parts: vec![PartEntry::new("1206", "MLCC", "C24497")],
    };
    LibraryEditor::apply(&mut doc, &request, &EditOptions::default()).unwrap();

    let summary = summarize_deviceset(get_existing_deviceset(&doc, "100NF").unwrap());
    assert_eq!(summary.symbols, vec!["R-US"]);
    // Prefix left alone when not given.
    assert_eq!(summary.prefix.as_deref(), Some("C"));

    request.parts.clear();
    let err = LibraryEditor::apply(&mut doc, &request, &EditOptions::default()).unwrap_err();
    assert!(matches!(err, LibraryError::Validation(_)));
}

#[test]
fn test_apply_with_custom_template_name() {
    let mut doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    let options = EditOptions {
        template_name: "100NF".to_string(),
        ..EditOptions::default()
    };
    LibraryEditor::apply(
        &mut doc,
        &resistor_request("22PF", vec![PartEntry::new("1206", "C0G", "C1804")]),
        &options,
    )
    .unwrap();
    let summary = summarize_deviceset(get_existing_deviceset(&doc, "22PF").unwrap());
    assert_eq!(summary.symbols, vec!["C-US"]);
    assert_eq!(summary.devices[0].connects, 2);
}

#[test]
fn test_apply_to_file_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_copy(dir.path(), "passives.lbr");

    let outcome = LibraryEditor::apply_to_file(
        &path,
        &resistor_request("1K", vec![PartEntry::new("0603", "1k resistor", "C21190")]),
        &EditOptions::default(),
    )
    .expect("Should edit file");
    assert_eq!(outcome.action, EditAction::Created);

    let reloaded = LibraryDocument::load(&path).unwrap();
    let ds = get_existing_deviceset(&reloaded, "1K").expect("Saved deviceset should reload");
    assert_eq!(ds.attr("prefix"), Some("R"));
    assert_eq!(ds.attr("uservalue"), Some("yes"));
}

#[test]
fn test_apply_to_file_failure_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = scratch_copy(dir.path(), "passives.lbr");
    let before = std::fs::read_to_string(&path).unwrap();

    let request = resistor_request("1K", vec![PartEntry::new("0603", "", "")]);
    let err = LibraryEditor::apply_to_file(&path, &request, &EditOptions::default()).unwrap_err();

    assert!(matches!(err, LibraryError::Validation(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_apply_without_devicesets_is_structure_error() {
    let mut doc = LibraryDocument::parse_str(
        "<?xml version=\"1.0\"?><eagle><drawing><library/></drawing></eagle>",
    )
    .unwrap();
    let err = LibraryEditor::apply(
        &mut doc,
        &resistor_request("1K", vec![PartEntry::new("0603", "r", "C1")]),
        &EditOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LibraryError::Structure(_)));
}

#[test]
fn test_manifest_loading() {
    let parts = PartEntry::load_manifest(&fixture_path("parts.json")).unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[1], PartEntry::new("0603", "10k 1% 1/10W resistor", "C25804"));

    let err = PartEntry::load_manifest(&fixture_path("passives.lbr")).unwrap_err();
    assert!(matches!(err, LibraryError::Parse(_)));
}
