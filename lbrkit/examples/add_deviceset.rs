//! Add a deviceset to a library and print what changed.

use lbrkit::prelude::*;
use std::path::Path;

fn main() -> Result<(), LibraryError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/passives.lbr".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example add_deviceset [path/to/library.lbr]");
        std::process::exit(1);
    }

    let mut doc = LibraryDocument::load(path)?;
    println!("Packages: {}", doc.list_packages().join(", "));

    let request = EditRequest {
        name: "10K".to_string(),
        prefix: Some("R".to_string()),
        value: "10k".to_string(),
        symbol: None,
        parts: vec![
            PartEntry::new("0402", "10k 1% 1/16W thick film", "C25744"),
            PartEntry::new("0603", "10k 1% 1/10W thick film", "C25804"),
        ],
    };

    // Applied in memory only; call doc.save(path) to write it back.
    let outcome = LibraryEditor::apply(&mut doc, &request, &EditOptions::default())?;
    println!(
        "{:?} '{}': {} updated, {} added",
        outcome.action, outcome.deviceset, outcome.updated, outcome.added
    );
    Ok(())
}
