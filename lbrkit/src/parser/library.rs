//! Eagle library document access
//!
//! Loads a `.lbr` file into an in-memory [`XmlDocument`] and writes it back.
//! Element names below are the ones Eagle uses and must be reproduced exactly:
//!
//! ```text
//! eagle/drawing/library/packages/package
//! eagle/drawing/library/symbols/symbol
//! eagle/drawing/library/devicesets/deviceset/devices/device/technologies/technology/attribute
//! ```

use std::io::Write;
use std::path::Path;

use crate::core::LibraryError;
use crate::parser::xml::{Element, XmlDocument};

pub const LIBRARY_PATH: &str = "drawing/library";
pub const PACKAGES_PATH: &str = "drawing/library/packages";
pub const SYMBOLS_PATH: &str = "drawing/library/symbols";
pub const DEVICESETS_PATH: &str = "drawing/library/devicesets";

/// An Eagle library held in memory for one edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryDocument {
    xml: XmlDocument,
}

impl LibraryDocument {
    /// Parse the library at `path`.
    ///
    /// A missing or unreadable file is reported as [`LibraryError::Parse`],
    /// same as malformed XML, so callers only have one failure to display.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LibraryError::Parse(format!("{}: {}", path.display(), e)))?;
        let xml = XmlDocument::parse(&content)
            .map_err(|e| LibraryError::Parse(format!("{}: {}", path.display(), e)))?;
        let doc = Self { xml };
        tracing::info!(
            "Loaded library {} ({} devicesets)",
            path.display(),
            doc.devicesets().map(|d| d.children_named("deviceset").count()).unwrap_or(0)
        );
        Ok(doc)
    }

    pub fn parse_str(content: &str) -> Result<Self, LibraryError> {
        let xml = XmlDocument::parse(content)?;
        Ok(Self { xml })
    }

    /// Overwrite `path` with the whole document via a temp file in the same directory.
    /// An existing file keeps its permissions.
    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        self.save_with(path, true)
    }

    /// Overwrite `path`; with `atomic` unset the target is truncated and written directly.
    pub fn save_with(&self, path: &Path, atomic: bool) -> Result<(), LibraryError> {
        let content = self.to_xml_string();
        if atomic {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(content.as_bytes())?;
            // The temp file is created 0600; keep the target's mode across the rename.
            if let Ok(meta) = std::fs::metadata(path) {
                tmp.as_file().set_permissions(meta.permissions())?;
            }
            tmp.as_file().sync_all()?;
            tmp.persist(path).map_err(|e| e.error)?;
        } else {
            std::fs::write(path, content.as_bytes())?;
        }
        tracing::info!("Saved library {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    pub fn to_xml_string(&self) -> String {
        self.xml.to_xml_string()
    }

    pub fn root(&self) -> &Element {
        &self.xml.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.xml.root
    }

    pub fn library(&self) -> Option<&Element> {
        self.xml.root.find(LIBRARY_PATH)
    }

    pub fn devicesets(&self) -> Option<&Element> {
        self.xml.root.find(DEVICESETS_PATH)
    }

    pub fn devicesets_mut(&mut self) -> Option<&mut Element> {
        self.xml.root.find_mut(DEVICESETS_PATH)
    }

    /// The `devicesets` container, created under `library` when missing.
    pub fn ensure_devicesets(&mut self) -> Result<&mut Element, LibraryError> {
        let library = self.xml.root.find_mut(LIBRARY_PATH).ok_or_else(|| {
            LibraryError::Structure("Cannot find <library> to attach <devicesets>".to_string())
        })?;
        Ok(library.get_or_insert_child("devicesets"))
    }

    /// Every `<package>` name, sorted case-insensitively.
    pub fn list_packages(&self) -> Vec<String> {
        self.sorted_names(PACKAGES_PATH, "package")
    }

    /// Every `<symbol>` name, sorted case-insensitively.
    pub fn list_symbols(&self) -> Vec<String> {
        self.sorted_names(SYMBOLS_PATH, "symbol")
    }

    fn sorted_names(&self, container: &str, tag: &str) -> Vec<String> {
        let Some(parent) = self.xml.root.find(container) else {
            return Vec::new();
        };
        let mut names: Vec<String> = parent
            .children_named(tag)
            .filter_map(|e| e.attr("name"))
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }
}
