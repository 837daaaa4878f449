//! Technology attribute helpers.

use crate::parser::xml::Element;

pub const DESCRIPTION: &str = "DESCRIPTION";
pub const LCSC_PART: &str = "LCSC_PART";
pub const VALUE: &str = "VALUE";

/// Set `name` to `value` on the first matching `<attribute>`, or append one with `constant="no"`.
///
/// Values are stored as given, spaces included.
pub fn upsert(technology: &mut Element, name: &str, value: &str) {
    if let Some(attr) = technology
        .children_named_mut("attribute")
        .find(|a| a.attr("name") == Some(name))
    {
        attr.set_attr("value", value);
        return;
    }
    technology.append_child(
        Element::new("attribute")
            .with_attr("name", name)
            .with_attr("value", value)
            .with_attr("constant", "no"),
    );
}

/// Value of the first `<attribute>` called `name`.
pub fn attribute_value<'a>(technology: &'a Element, name: &str) -> Option<&'a str> {
    technology
        .children_named("attribute")
        .find(|a| a.attr("name") == Some(name))
        .and_then(|a| a.attr("value"))
}

/// The device's `technologies/technology`, creating either level when absent.
pub fn ensure_technology(device: &mut Element) -> &mut Element {
    let technologies = device.get_or_insert_child("technologies");
    if technologies.child("technology").is_none() {
        // Eagle requires the name attribute; the default technology is unnamed.
        technologies.append_child(Element::new("technology").with_attr("name", ""));
    }
    technologies.get_or_insert_child("technology")
}

pub fn technology(device: &Element) -> Option<&Element> {
    device.find("technologies/technology")
}
