//! lbrkit - Eagle component library deviceset editing
//!
//! This library adds or updates devicesets in Eagle `.lbr` libraries without
//! hand-editing XML. New footprint variants are cloned from a template
//! deviceset or from wherever the footprint is already wired in the library,
//! so pin-to-pad `<connects>` carry over untouched.
//!
//! # Quick Start
//!
//! ```no_run
//! use lbrkit::{EditOptions, EditRequest, LibraryEditor, PartEntry};
//! use std::path::Path;
//!
//! let request = EditRequest {
//!     name: "10K".to_string(),
//!     prefix: Some("R".to_string()),
//!     value: "10k".to_string(),
//!     symbol: None,
//!     parts: vec![PartEntry::new("0402", "10k 1% resistor", "C25744")],
//! };
//! let outcome = LibraryEditor::apply_to_file(
//!     Path::new("passives.lbr"),
//!     &request,
//!     &EditOptions::default(),
//! ).unwrap();
//!
//! println!("{:?}: {} updated, {} added", outcome.action, outcome.updated, outcome.added);
//! ```
//!
//! # Features
//!
//! - **Template resolution**: `DEVICE_NAME` deviceset, else the first one
//! - **Merge**: update existing variants, append missing ones
//! - **Create**: new deviceset from template gates and selected variants
//! - **Library-wide search**: reuse connects for a footprint from any deviceset

pub mod core;
pub mod library;
pub mod parser;

// Re-export main types
pub use crate::core::{
    EditAction, EditOptions, EditOutcome, EditRequest, LibraryEditor, LibraryError, PartEntry,
    PartitionedParts,
};
pub use crate::library::{
    create, extract_variants, find_existing_variant, find_template, find_template_named,
    get_existing_deviceset, list_devicesets, merge, require_deviceset, summarize_deviceset,
    template_footprints, upsert, DeviceSummary, DevicesetSummary, MergeCounts, MetadataMap,
    PartMetadata, VariantMap, TEMPLATE_NAME,
};
pub use crate::parser::library::LibraryDocument;
pub use crate::parser::xml::Element;

/// Load a library file (convenience wrapper).
pub fn load_library(path: &std::path::Path) -> Result<LibraryDocument, LibraryError> {
    LibraryDocument::load(path)
}

/// Save a library file through a temp file (convenience wrapper).
pub fn save_library(doc: &LibraryDocument, path: &std::path::Path) -> Result<(), LibraryError> {
    doc.save(path)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        EditAction, EditOptions, EditOutcome, EditRequest, LibraryDocument, LibraryEditor,
        LibraryError, MergeCounts, MetadataMap, PartEntry, PartMetadata,
    };
}
