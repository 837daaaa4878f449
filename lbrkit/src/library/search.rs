//! Library-wide footprint search.
//!
//! Pin-to-pad wiring is tedious to author, and a footprint usually already
//! has correct `<connects>` under some other deviceset. Searching the whole
//! library lets a new variant reuse it.

use crate::library::device::matches_footprint;
use crate::parser::library::{LibraryDocument, DEVICESETS_PATH};
use crate::parser::xml::Element;

/// Deep copy of the first `<device>` in document order whose `name` or `package` is `footprint`.
pub fn find_existing_variant(doc: &LibraryDocument, footprint: &str) -> Option<Element> {
    let path = format!("{}/deviceset/devices/device", DEVICESETS_PATH);
    let found = doc
        .root()
        .find_all(&path)
        .into_iter()
        .find(|dev| matches_footprint(dev, footprint))
        .cloned();
    if found.is_some() {
        tracing::debug!("Found existing device for footprint '{}'", footprint);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB: &str = r#"<eagle><drawing><library><devicesets>
<deviceset name="A"><devices><device name="" package="SOT23"><connects><connect gate="G$1" pin="1" pad="1"/></connects></device></devices></deviceset>
<deviceset name="B"><devices/></deviceset>
<deviceset name="C"/>
<deviceset name="D"><devices><device name="0603" package="0603"><connects><connect gate="G$1" pin="1" pad="2"/></connects></device><device name="SOT23" package="X"/></devices></deviceset>
</devicesets></library></drawing></eagle>"#;

    #[test]
    fn test_finds_by_package() {
        let doc = LibraryDocument::parse_str(LIB).unwrap();
        let dev = find_existing_variant(&doc, "SOT23").unwrap();
        // First match in document order wins.
        assert_eq!(dev.attr("package"), Some("SOT23"));
        assert!(dev.child("connects").is_some());
    }

    #[test]
    fn test_finds_by_name_in_later_deviceset() {
        let doc = LibraryDocument::parse_str(LIB).unwrap();
        let dev = find_existing_variant(&doc, "0603").unwrap();
        let pad = dev.find("connects/connect").and_then(|c| c.attr("pad"));
        assert_eq!(pad, Some("2"));
    }

    #[test]
    fn test_absent_footprint() {
        let doc = LibraryDocument::parse_str(LIB).unwrap();
        assert!(find_existing_variant(&doc, "1206").is_none());
    }

    #[test]
    fn test_result_is_a_copy() {
        let doc = LibraryDocument::parse_str(LIB).unwrap();
        let before = doc.to_xml_string();
        let mut dev = find_existing_variant(&doc, "0603").unwrap();
        dev.set_attr("name", "changed");
        assert_eq!(doc.to_xml_string(), before);
    }
}
