//! Create a new deviceset from a template.

use crate::core::LibraryError;
use crate::library::device::{
    apply_metadata, metadata_for, resolve_source, unique_selections, MetadataMap,
};
use crate::library::merge::retarget_gates;
use crate::library::template::{extract_variants, get_existing_deviceset};
use crate::parser::library::LibraryDocument;
use crate::parser::xml::Element;

/// Append a deviceset called `new_name` holding only the selected footprints.
///
/// The template's `<gates>` are copied verbatim (then retargeted to
/// `symbol_override` if given; the template itself is not modified). Each
/// footprint is cloned from the template's variant, else from the first
/// device in the library with that footprint, else added blank.
///
/// The returned deviceset has no `prefix` or `uservalue` yet.
pub fn create<'a>(
    doc: &'a mut LibraryDocument,
    template: Option<&Element>,
    new_name: &str,
    selections: &[String],
    metadata: &MetadataMap,
    symbol_override: Option<&str>,
) -> Result<&'a mut Element, LibraryError> {
    if new_name.trim().is_empty() {
        return Err(LibraryError::Validation("Deviceset name must not be empty".to_string()));
    }
    if let Some(existing) = get_existing_deviceset(doc, new_name) {
        return Err(LibraryError::DuplicateName(
            existing.attr("name").unwrap_or(new_name).to_string(),
        ));
    }

    let mut deviceset = Element::new("deviceset").with_attr("name", new_name);

    if let Some(gates) = template.and_then(|t| t.child("gates")) {
        deviceset.append_child(gates.clone());
        if let Some(symbol) = symbol_override.filter(|s| !s.is_empty()) {
            retarget_gates(&mut deviceset, symbol);
        }
    }

    let template_variants = template.map(extract_variants).unwrap_or_default();
    let devices = deviceset.append_child(Element::new("devices"));
    for footprint in unique_selections(selections) {
        let mut device = resolve_source(doc, footprint, Some(&template_variants));
        apply_metadata(&mut device, &metadata_for(metadata, footprint));
        devices.append_child(device);
    }

    tracing::info!(
        "Created deviceset '{}' with {} device(s)",
        new_name,
        devices.children_named("device").count()
    );
    let devicesets = doc.ensure_devicesets()?;
    Ok(devicesets.append_child(deviceset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::attribute::{attribute_value, technology, VALUE};
    use crate::library::device::PartMetadata;
    use crate::library::template::find_template;

    const LIB: &str = r#"<eagle><drawing><library><devicesets>
<deviceset name="DEVICE_NAME"><gates><gate name="G$1" symbol="R" x="0" y="0"/></gates><devices>
<device name="0402" package="0402"><connects><connect gate="G$1" pin="1" pad="1"/><connect gate="G$1" pin="2" pad="2"/></connects></device>
<device name="0603" package="0603"/>
</devices></deviceset>
</devicesets></library></drawing></eagle>"#;

    fn sel(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_copies_gates_and_selected_devices() {
        let mut doc = LibraryDocument::parse_str(LIB).unwrap();
        let template = find_template(&doc).unwrap().clone();
        let mut metadata = MetadataMap::new();
        metadata.insert("0402".into(), PartMetadata::new("10k", "resistor", "C25744"));

        let ds = create(&mut doc, Some(&template), "10K", &sel(&["0402"]), &metadata, None).unwrap();
        assert_eq!(ds.attr("name"), Some("10K"));
        assert_eq!(ds.find("gates/gate").and_then(|g| g.attr("symbol")), Some("R"));
        let devices: Vec<_> = ds.find_all("devices/device");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].find_all("connects/connect").len(), 2);
        assert_eq!(attribute_value(technology(devices[0]).unwrap(), VALUE), Some("10k"));
    }

    #[test]
    fn test_symbol_override_only_touches_clone() {
        let mut doc = LibraryDocument::parse_str(LIB).unwrap();
        let template = find_template(&doc).unwrap().clone();
        create(&mut doc, Some(&template), "X", &[], &MetadataMap::new(), Some("R-EU")).unwrap();
        let new_ds = get_existing_deviceset(&doc, "X").unwrap();
        let tmpl = get_existing_deviceset(&doc, "DEVICE_NAME").unwrap();
        assert_eq!(new_ds.find("gates/gate").and_then(|g| g.attr("symbol")), Some("R-EU"));
        assert_eq!(tmpl.find("gates/gate").and_then(|g| g.attr("symbol")), Some("R"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut doc = LibraryDocument::parse_str(LIB).unwrap();
        let err = create(&mut doc, None, "device_name", &[], &MetadataMap::new(), None).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateName(_)));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut doc = LibraryDocument::parse_str(LIB).unwrap();
        let err = create(&mut doc, None, "  ", &[], &MetadataMap::new(), None).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
    }

    #[test]
    fn test_create_without_template_uses_library_search() {
        let mut doc = LibraryDocument::parse_str(LIB).unwrap();
        let ds = create(&mut doc, None, "NEW", &sel(&["0402"]), &MetadataMap::new(), None).unwrap();
        assert!(ds.child("gates").is_none());
        assert_eq!(ds.find_all("devices/device/connects/connect").len(), 2);
    }

    #[test]
    fn test_create_makes_devicesets_container() {
        let mut doc = LibraryDocument::parse_str("<eagle><drawing><library/></drawing></eagle>").unwrap();
        create(&mut doc, None, "A", &sel(&["0402"]), &MetadataMap::new(), None).unwrap();
        assert!(get_existing_deviceset(&doc, "A").is_some());
    }
}
