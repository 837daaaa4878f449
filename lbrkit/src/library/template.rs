//! Template deviceset resolution and deviceset lookup.

use crate::core::LibraryError;
use crate::library::device::{device_key, VariantMap};
use crate::parser::library::LibraryDocument;
use crate::parser::xml::Element;

/// Name of the deviceset that seeds new devicesets.
pub const TEMPLATE_NAME: &str = "DEVICE_NAME";

/// The deviceset named [`TEMPLATE_NAME`], else the first deviceset in the document.
pub fn find_template(doc: &LibraryDocument) -> Result<&Element, LibraryError> {
    find_template_named(doc, TEMPLATE_NAME)
}

/// As [`find_template`] with a caller-chosen sentinel name (exact match).
pub fn find_template_named<'a>(
    doc: &'a LibraryDocument,
    template_name: &str,
) -> Result<&'a Element, LibraryError> {
    let devicesets = doc
        .devicesets()
        .ok_or_else(|| LibraryError::Structure("<devicesets> not found under <library>".to_string()))?;

    if let Some(ds) = devicesets
        .children_named("deviceset")
        .find(|ds| ds.attr("name") == Some(template_name))
    {
        return Ok(ds);
    }

    let first = devicesets
        .child("deviceset")
        .ok_or_else(|| LibraryError::Structure("No <deviceset> found under <devicesets>".to_string()))?;
    tracing::debug!(
        "Template '{}' not found; using first deviceset '{}'",
        template_name,
        first.attr("name").unwrap_or("")
    );
    Ok(first)
}

/// Every `<device>` under the deviceset, keyed by identifier, as independent copies.
/// Devices without any identifier are skipped.
pub fn extract_variants(deviceset: &Element) -> VariantMap {
    let mut variants = VariantMap::new();
    let Some(devices) = deviceset.child("devices") else {
        return variants;
    };
    for dev in devices.children_named("device") {
        if let Some(key) = device_key(dev) {
            variants.entry(key.to_string()).or_insert_with(|| dev.clone());
        }
    }
    variants
}

/// Deviceset whose name matches `name` case-insensitively.
pub fn get_existing_deviceset<'a>(doc: &'a LibraryDocument, name: &str) -> Option<&'a Element> {
    let target = name.to_lowercase();
    doc.devicesets()?
        .children_named("deviceset")
        .find(|ds| ds.attr("name").unwrap_or("").to_lowercase() == target)
}

pub fn get_existing_deviceset_mut<'a>(
    doc: &'a mut LibraryDocument,
    name: &str,
) -> Option<&'a mut Element> {
    let target = name.to_lowercase();
    doc.devicesets_mut()?
        .children_named_mut("deviceset")
        .find(|ds| ds.attr("name").unwrap_or("").to_lowercase() == target)
}

/// As [`get_existing_deviceset`], failing with [`LibraryError::NotFound`].
pub fn require_deviceset<'a>(doc: &'a LibraryDocument, name: &str) -> Result<&'a Element, LibraryError> {
    get_existing_deviceset(doc, name)
        .ok_or_else(|| LibraryError::NotFound(format!("Deviceset '{}' not found", name)))
}

/// Deviceset names in document order.
pub fn list_devicesets(doc: &LibraryDocument) -> Vec<String> {
    doc.devicesets()
        .map(|dss| {
            dss.children_named("deviceset")
                .filter_map(|ds| ds.attr("name"))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Identifiers of the template's variants, sorted. These are the footprints a user picks from.
pub fn template_footprints(doc: &LibraryDocument, template_name: &str) -> Result<Vec<String>, LibraryError> {
    let template = find_template_named(doc, template_name)?;
    // BTreeMap keys are already sorted.
    Ok(extract_variants(template).into_keys().collect())
}
