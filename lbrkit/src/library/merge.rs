//! Merge footprint selections into an existing deviceset.
//!
//! Footprints already present are updated in place (technology attributes
//! only). Missing ones are cloned from the template, else from any deviceset
//! in the library that already wires that footprint, else added blank.
//! Devices that were not selected are never touched.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::core::LibraryError;
use crate::library::device::{
    apply_metadata, device_key, metadata_for, resolve_source, unique_selections, MetadataMap,
    VariantMap,
};
use crate::library::template::{get_existing_deviceset, get_existing_deviceset_mut};
use crate::parser::library::LibraryDocument;
use crate::parser::xml::Element;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub updated: usize,
    pub added: usize,
}

/// Merge `selections` into the deviceset called `deviceset_name` (case-insensitive).
///
/// The document is taken whole because new variants may be copied from any
/// other deviceset in it. Fails with [`LibraryError::NotFound`] when the
/// deviceset does not exist. The caller saves.
pub fn merge(
    doc: &mut LibraryDocument,
    deviceset_name: &str,
    selections: &[String],
    template_variants: Option<&VariantMap>,
    metadata: &MetadataMap,
    symbol_override: Option<&str>,
) -> Result<MergeCounts, LibraryError> {
    let selections = unique_selections(selections);

    // Resolve sources for missing footprints before taking the mutable borrow.
    let target = get_existing_deviceset(doc, deviceset_name)
        .ok_or_else(|| LibraryError::NotFound(format!("Deviceset '{}' not found", deviceset_name)))?;
    let existing: HashSet<String> = target
        .find_all("devices/device")
        .into_iter()
        .filter_map(device_key)
        .map(str::to_string)
        .collect();
    let mut sources: HashMap<&str, Element> = selections
        .iter()
        .filter(|s| !existing.contains(**s))
        .map(|s| (*s, resolve_source(doc, s, template_variants)))
        .collect();

    let target = get_existing_deviceset_mut(doc, deviceset_name)
        .ok_or_else(|| LibraryError::NotFound(format!("Deviceset '{}' not found", deviceset_name)))?;

    if let Some(symbol) = symbol_override.filter(|s| !s.is_empty()) {
        retarget_gates(target, symbol);
    }

    let devices = target.get_or_insert_child("devices");
    let mut counts = MergeCounts::default();

    for footprint in selections {
        let meta = metadata_for(metadata, footprint);
        if let Some(device) = devices
            .children_named_mut("device")
            .find(|d| device_key(d) == Some(footprint))
        {
            apply_metadata(device, &meta);
            counts.updated += 1;
            tracing::debug!("Updated device '{}'", footprint);
            continue;
        }

        let Some(mut device) = sources.remove(footprint) else {
            continue;
        };
        apply_metadata(&mut device, &meta);
        devices.append_child(device);
        counts.added += 1;
        tracing::debug!("Added device '{}'", footprint);
    }

    tracing::info!(
        "Merged into deviceset '{}': {} updated, {} added",
        deviceset_name,
        counts.updated,
        counts.added
    );
    Ok(counts)
}

/// Overwrite `symbol` on every `<gate>` under the deviceset's `<gates>`.
pub fn retarget_gates(deviceset: &mut Element, symbol: &str) {
    if let Some(gates) = deviceset.child_mut("gates") {
        for gate in gates.children_named_mut("gate") {
            gate.set_attr("symbol", symbol);
        }
    }
}
