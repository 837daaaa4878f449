//! Core edit logic shared by the CLI and any other front end.
//! No UI state: every call takes the document it works on.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::library::create::create;
use crate::library::device::{MetadataMap, PartMetadata};
use crate::library::merge::merge;
use crate::library::template::{
    extract_variants, find_template_named, get_existing_deviceset, get_existing_deviceset_mut,
    TEMPLATE_NAME,
};
use crate::parser::library::LibraryDocument;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Structure error: {0}")]
    Structure(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Deviceset '{0}' already exists")]
    DuplicateName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<crate::parser::xml::XmlError> for LibraryError {
    fn from(e: crate::parser::xml::XmlError) -> Self {
        LibraryError::Parse(e.to_string())
    }
}

/// Options for edit runs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EditOptions {
    /// Name of the deviceset used as template; falls back to the first deviceset.
    pub template_name: String,
    /// Save through a temp file and rename instead of overwriting in place.
    pub atomic_save: bool,
    /// Value written to `uservalue` on the edited deviceset.
    pub uservalue: String,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            template_name: TEMPLATE_NAME.to_string(),
            atomic_save: true,
            uservalue: "yes".to_string(),
        }
    }
}

/// One footprint row as entered by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartEntry {
    pub footprint: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub part_reference: String,
}

impl PartEntry {
    pub fn new(footprint: &str, description: &str, part_reference: &str) -> Self {
        Self {
            footprint: footprint.to_string(),
            description: description.to_string(),
            part_reference: part_reference.to_string(),
        }
    }

    /// Read a JSON array of part entries.
    pub fn load_manifest(path: &Path) -> Result<Vec<PartEntry>, LibraryError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LibraryError::Parse(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| LibraryError::Parse(format!("{}: {}", path.display(), e)))
    }
}

/// Everything needed to add or update one deviceset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EditRequest {
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    pub value: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub parts: Vec<PartEntry>,
}

/// Parts split into those that can be written and those missing a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionedParts {
    pub selections: Vec<String>,
    pub metadata: MetadataMap,
    pub skipped: Vec<String>,
}

impl EditRequest {
    /// Trim every part and keep the ones with both a description and a part reference.
    /// The request's shared `value` is used for every kept part.
    ///
    /// A footprint lands in exactly one of `selections` and `skipped`: the first
    /// complete row for it wins, even after an incomplete one.
    pub fn partition(&self) -> PartitionedParts {
        let value = self.value.trim();
        let mut out = PartitionedParts::default();
        for part in &self.parts {
            let footprint = part.footprint.trim();
            let description = part.description.trim();
            let part_reference = part.part_reference.trim();
            if footprint.is_empty() || out.metadata.contains_key(footprint) {
                continue;
            }
            if description.is_empty() || part_reference.is_empty() {
                if !out.skipped.iter().any(|s| s == footprint) {
                    out.skipped.push(footprint.to_string());
                }
                continue;
            }
            out.skipped.retain(|s| s != footprint);
            out.selections.push(footprint.to_string());
            out.metadata.insert(
                footprint.to_string(),
                PartMetadata::new(value, description, part_reference),
            );
        }
        out
    }

    /// Check the request and return the writable parts.
    pub fn validate(&self) -> Result<PartitionedParts, LibraryError> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::Validation(
                "You must enter a deviceset name (new or existing)".to_string(),
            ));
        }
        if self.value.trim().is_empty() {
            return Err(LibraryError::Validation("You must enter a value".to_string()));
        }
        if self.parts.is_empty() {
            return Err(LibraryError::Validation(
                "Select at least one package to update".to_string(),
            ));
        }
        let parts = self.partition();
        if parts.selections.is_empty() {
            return Err(LibraryError::Validation(
                "None of the selected packages have both a description and a part reference"
                    .to_string(),
            ));
        }
        Ok(parts)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditAction {
    Created,
    Merged,
}

/// What an edit did, for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub deviceset: String,
    pub action: EditAction,
    pub updated: usize,
    pub added: usize,
    pub skipped: Vec<String>,
}

/// Core edit API.
pub struct LibraryEditor;

impl LibraryEditor {
    /// Apply `request` to an in-memory document: merge into the deviceset if it
    /// exists (case-insensitive), else create it from the template. Sets
    /// `prefix` (when given) and `uservalue` on the result. Nothing is saved.
    pub fn apply(
        doc: &mut LibraryDocument,
        request: &EditRequest,
        options: &EditOptions,
    ) -> Result<EditOutcome, LibraryError> {
        let parts = request.validate()?;
        if !parts.skipped.is_empty() {
            tracing::warn!("Skipped (missing fields): {}", parts.skipped.join(", "));
        }

        let name = request.name.trim();
        let prefix = request.prefix.as_deref().map(str::trim).filter(|p| !p.is_empty());
        let symbol = request.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let template = find_template_named(doc, &options.template_name)?.clone();
        let template_variants = extract_variants(&template);

        let existing_name = get_existing_deviceset(doc, name)
            .map(|ds| ds.attr("name").unwrap_or(name).to_string());

        let (deviceset, action, updated, added) = match existing_name {
            Some(existing) => {
                let counts = merge(
                    doc,
                    &existing,
                    &parts.selections,
                    Some(&template_variants),
                    &parts.metadata,
                    symbol,
                )?;
                (existing, EditAction::Merged, counts.updated, counts.added)
            }
            None => {
                create(
                    doc,
                    Some(&template),
                    name,
                    &parts.selections,
                    &parts.metadata,
                    symbol,
                )?;
                (name.to_string(), EditAction::Created, 0, parts.selections.len())
            }
        };

        let ds = get_existing_deviceset_mut(doc, &deviceset)
            .ok_or_else(|| LibraryError::NotFound(format!("Deviceset '{}' not found", deviceset)))?;
        if let Some(prefix) = prefix {
            ds.set_attr("prefix", prefix);
        }
        ds.set_attr("uservalue", &options.uservalue);

        Ok(EditOutcome {
            deviceset,
            action,
            updated,
            added,
            skipped: parts.skipped,
        })
    }

    /// Load `path`, apply `request`, and save back to `path`.
    /// On any error the file on disk is left as it was.
    pub fn apply_to_file(
        path: &Path,
        request: &EditRequest,
        options: &EditOptions,
    ) -> Result<EditOutcome, LibraryError> {
        let mut doc = LibraryDocument::load(path)?;
        let outcome = Self::apply(&mut doc, request, options)?;
        doc.save_with(path, options.atomic_save)?;
        Ok(outcome)
    }
}
