//! Read-only view of a deviceset for display.

use serde::Serialize;

use crate::library::attribute::{attribute_value, technology, DESCRIPTION, LCSC_PART, VALUE};
use crate::library::device::device_key;
use crate::parser::xml::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub footprint: String,
    pub package: Option<String>,
    pub description: Option<String>,
    pub part_reference: Option<String>,
    pub value: Option<String>,
    pub connects: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevicesetSummary {
    pub name: String,
    pub prefix: Option<String>,
    pub uservalue: bool,
    pub symbols: Vec<String>,
    pub devices: Vec<DeviceSummary>,
}

pub fn summarize_device(device: &Element) -> DeviceSummary {
    let tech = technology(device);
    let read = |name: &str| tech.and_then(|t| attribute_value(t, name)).map(str::to_string);
    DeviceSummary {
        footprint: device_key(device).unwrap_or("").to_string(),
        package: device.attr("package").map(str::to_string),
        description: read(DESCRIPTION),
        part_reference: read(LCSC_PART),
        value: read(VALUE),
        connects: device.find_all("connects/connect").len(),
    }
}

/// Deviceset attributes, gate symbols and devices sorted by footprint.
pub fn summarize_deviceset(deviceset: &Element) -> DevicesetSummary {
    let mut devices: Vec<DeviceSummary> = deviceset
        .find_all("devices/device")
        .into_iter()
        .map(summarize_device)
        .collect();
    devices.sort_by(|a, b| a.footprint.cmp(&b.footprint));

    DevicesetSummary {
        name: deviceset.attr("name").unwrap_or("").to_string(),
        prefix: deviceset.attr("prefix").map(str::to_string),
        uservalue: deviceset.attr("uservalue") == Some("yes"),
        symbols: deviceset
            .find_all("gates/gate")
            .into_iter()
            .filter_map(|g| g.attr("symbol"))
            .map(str::to_string)
            .collect(),
        devices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::library::LibraryDocument;
    use crate::library::template::require_deviceset;

    #[test]
    fn test_summarize_deviceset() {
        let doc = LibraryDocument::parse_str(
            r#"<eagle><drawing><library><devicesets>
<deviceset name="C" prefix="C" uservalue="yes"><gates><gate name="G$1" symbol="CAP"/></gates><devices>
<device name="0603" package="0603"><technologies><technology name=""><attribute name="DESCRIPTION" value="cap"/><attribute name="LCSC_PART" value="C14663"/></technology></technologies></device>
<device name="0402" package="0402"><connects><connect gate="G$1" pin="1" pad="1"/><connect gate="G$1" pin="2" pad="2"/></connects></device>
</devices></deviceset></devicesets></library></drawing></eagle>"#,
        )
        .unwrap();
        let summary = summarize_deviceset(require_deviceset(&doc, "c").unwrap());
        assert_eq!(summary.name, "C");
        assert_eq!(summary.prefix.as_deref(), Some("C"));
        assert!(summary.uservalue);
        assert_eq!(summary.symbols, vec!["CAP"]);
        assert_eq!(summary.devices.len(), 2);
        assert_eq!(summary.devices[0].footprint, "0402");
        assert_eq!(summary.devices[0].connects, 2);
        assert_eq!(summary.devices[0].description, None);
        assert_eq!(summary.devices[1].description.as_deref(), Some("cap"));
        assert_eq!(summary.devices[1].part_reference.as_deref(), Some("C14663"));
        assert_eq!(summary.devices[1].value, None);
    }
}
