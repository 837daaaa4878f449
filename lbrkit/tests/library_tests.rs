//! Tests for loading, saving and inspecting library files

use lbrkit::prelude::*;
use lbrkit::{find_existing_variant, find_template, list_devicesets, template_footprints};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_load_fixture() {
    let doc = LibraryDocument::load(&fixture_path("passives.lbr")).expect("Should parse library");

    assert_eq!(doc.list_packages(), vec!["0402", "0603", "0805", "1206"]);
    assert_eq!(doc.list_symbols(), vec!["C-US", "R-US"]);
    assert_eq!(list_devicesets(&doc), vec!["DEVICE_NAME", "100NF"]);
}

#[test]
fn test_load_nonexistent_is_parse_error() {
    let result = LibraryDocument::load(&PathBuf::from("not_a_real_file.lbr"));
    assert!(matches!(result, Err(LibraryError::Parse(_))));
}

#[test]
fn test_load_malformed_is_parse_error() {
    let err = LibraryDocument::load(&fixture_path("malformed.lbr")).unwrap_err();
    assert!(matches!(err, LibraryError::Parse(_)));
    assert!(err.to_string().contains("malformed.lbr"), "Error should name the file: {}", err);
}

#[test]
fn test_save_round_trip_is_byte_identical() {
    let source = fixture_path("passives.lbr");
    let original = std::fs::read_to_string(&source).unwrap();
    let doc = LibraryDocument::load(&source).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("copy.lbr");
    doc.save(&target).expect("Should save");

    assert_eq!(std::fs::read_to_string(&target).unwrap(), original);
}

#[test]
fn test_save_keeps_declaration_and_doctype() {
    let doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    let out = doc.to_xml_string();
    assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE eagle SYSTEM \"eagle.dtd\">"));
    assert!(out.contains("&lt;b&gt;Passives&lt;/b&gt;"));
}

#[cfg(unix)]
#[test]
fn test_atomic_save_keeps_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("passives.lbr");
    std::fs::copy(fixture_path("passives.lbr"), &target).unwrap();

    for mode in [0o644, 0o664] {
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode)).unwrap();
        let doc = LibraryDocument::load(&target).unwrap();
        doc.save(&target).expect("Should save");

        let after = std::fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(after, mode);
    }
}

#[test]
fn test_save_to_missing_directory_is_io_error() {
    let doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("no_such_dir").join("out.lbr");

    assert!(matches!(doc.save(&target), Err(LibraryError::Io(_))));
    assert!(matches!(doc.save_with(&target, false), Err(LibraryError::Io(_))));
}

#[test]
fn test_template_fallback_to_first_deviceset() {
    let doc = LibraryDocument::load(&fixture_path("no_template.lbr")).unwrap();
    let template = find_template(&doc).expect("Should fall back to first deviceset");
    assert_eq!(template.attr("name"), Some("2N7002"));
    assert_eq!(template_footprints(&doc, "DEVICE_NAME").unwrap(), vec!["SOT23"]);
}

#[test]
fn test_template_footprints_sorted() {
    let doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    assert_eq!(
        template_footprints(&doc, lbrkit::TEMPLATE_NAME).unwrap(),
        vec!["0402", "0603", "0805"]
    );
}

#[test]
fn test_library_search_finds_other_deviceset() {
    let doc = LibraryDocument::load(&fixture_path("passives.lbr")).unwrap();
    let dev = find_existing_variant(&doc, "1206").expect("1206 is wired under 100NF");
    let pads: Vec<_> = dev
        .find_all("connects/connect")
        .iter()
        .filter_map(|c| c.attr("pad"))
        .collect();
    assert_eq!(pads, vec!["2", "1"]);
    assert!(find_existing_variant(&doc, "2512").is_none());
}
