//! Footprint variants (`<device>`) and the metadata written onto them.
//!
//! A device is identified by its `name` attribute; older libraries sometimes
//! leave `name` empty and only carry `package`, so [`device_key`] falls back
//! to it. Library-wide search accepts a match on either field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::library::attribute::{self, DESCRIPTION, LCSC_PART, VALUE};
use crate::library::search::find_existing_variant;
use crate::parser::library::LibraryDocument;
use crate::parser::xml::Element;

/// Footprint name -> independent copy of a `<device>`.
pub type VariantMap = BTreeMap<String, Element>;

/// Footprint name -> metadata to write.
pub type MetadataMap = BTreeMap<String, PartMetadata>;

/// The three technology attributes managed for each footprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartMetadata {
    pub value: String,
    pub description: String,
    pub part_reference: String,
}

impl PartMetadata {
    pub fn new(value: &str, description: &str, part_reference: &str) -> Self {
        Self {
            value: value.to_string(),
            description: description.to_string(),
            part_reference: part_reference.to_string(),
        }
    }
}

/// Canonical identifier: `name`, or `package` when `name` is absent or empty.
pub fn device_key(device: &Element) -> Option<&str> {
    device
        .attr("name")
        .filter(|n| !n.is_empty())
        .or_else(|| device.attr("package").filter(|p| !p.is_empty()))
}

/// True when either `name` or `package` equals `footprint`.
pub fn matches_footprint(device: &Element, footprint: &str) -> bool {
    device.attr("name") == Some(footprint) || device.attr("package") == Some(footprint)
}

/// A `<device>` for `footprint` with no connects and no technologies.
pub fn blank_device(footprint: &str) -> Element {
    Element::new("device")
        .with_attr("name", footprint)
        .with_attr("package", footprint)
}

/// Point a cloned device at `footprint`.
pub fn retarget(device: &mut Element, footprint: &str) {
    device.set_attr("name", footprint);
    device.set_attr("package", footprint);
}

/// Write DESCRIPTION, LCSC_PART and VALUE into the device's technology.
/// Connects and every other child are left as they are.
pub fn apply_metadata(device: &mut Element, metadata: &PartMetadata) {
    let tech = attribute::ensure_technology(device);
    attribute::upsert(tech, DESCRIPTION, &metadata.description);
    attribute::upsert(tech, LCSC_PART, &metadata.part_reference);
    attribute::upsert(tech, VALUE, &metadata.value);
}

/// Pick the source device for a footprint that is not yet in the target deviceset:
/// the template's variant, else the first match anywhere in the library, else a blank device.
/// The result is already retargeted to `footprint`.
pub fn resolve_source(
    doc: &LibraryDocument,
    footprint: &str,
    template_variants: Option<&VariantMap>,
) -> Element {
    let mut device = if let Some(dev) = template_variants.and_then(|m| m.get(footprint)) {
        tracing::debug!("Footprint '{}' cloned from template", footprint);
        dev.clone()
    } else if let Some(dev) = find_existing_variant(doc, footprint) {
        tracing::debug!("Footprint '{}' cloned from library", footprint);
        dev
    } else {
        tracing::warn!(
            "No existing device for footprint '{}'; adding it without connects",
            footprint
        );
        blank_device(footprint)
    };
    retarget(&mut device, footprint);
    device
}

/// Selections in first-seen order with repeats dropped.
pub(crate) fn unique_selections(selections: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    selections
        .iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect()
}

/// Metadata for `footprint`; a missing entry yields empty attributes.
pub(crate) fn metadata_for<'a>(metadata: &'a MetadataMap, footprint: &str) -> std::borrow::Cow<'a, PartMetadata> {
    match metadata.get(footprint) {
        Some(m) => std::borrow::Cow::Borrowed(m),
        None => {
            tracing::debug!("No metadata for footprint '{}'; writing empty attributes", footprint);
            std::borrow::Cow::Owned(PartMetadata::default())
        }
    }
}
