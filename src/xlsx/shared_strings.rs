//! XLSX shared strings parsing.

use crate::error::{Error, Result};
use crate::xml::XmlNode;

/// Default location of the shared-string part.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Shared strings table.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    /// All strings in order
    strings: Vec<String>,
    /// Part the table was read from, for error context
    part: String,
}

impl SharedStrings {
    /// Parse shared strings from XML content.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = XmlNode::parse(xml)?;
        let strings = root.children_named("si").map(rich_text).collect();

        Ok(Self {
            strings,
            part: SHARED_STRINGS_PART.to_string(),
        })
    }

    /// Record which part the table came from.
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = part.into();
        self
    }

    /// Get a string by index.
    ///
    /// An index past the end of the table means the package is corrupt.
    pub fn get(&self, index: usize) -> Result<&str> {
        self.strings.get(index).map(|s| s.as_str()).ok_or_else(|| {
            Error::corrupt(
                &self.part,
                format!(
                    "shared string index {} out of range ({} entries)",
                    index,
                    self.strings.len()
                ),
            )
        })
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Plain text of a string item (`<si>` or inline `<is>`).
///
/// Rich-text runs are concatenated with their styling dropped; phonetic
/// hints (`<rPh>`) are not part of the value.
pub(crate) fn rich_text(item: &XmlNode) -> String {
    let mut text = String::new();
    for child in item.children() {
        match child.local_name() {
            "t" => text.push_str(child.text()),
            "r" => {
                for t in child.children_named("t") {
                    text.push_str(t.text());
                }
            }
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_strings() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="3">
    <si><t>Hello</t></si>
    <si><t>World</t></si>
    <si><t>Test</t></si>
</sst>"#;

        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 3);
        assert_eq!(ss.get(0).unwrap(), "Hello");
        assert_eq!(ss.get(1).unwrap(), "World");
        assert_eq!(ss.get(2).unwrap(), "Test");
    }

    #[test]
    fn test_index_out_of_range_is_corrupt() {
        let xml = r#"<sst><si><t>only</t></si></sst>"#;
        let ss = SharedStrings::parse(xml).unwrap();
        let err = ss.get(3).unwrap_err();
        assert!(matches!(err, Error::CorruptWorkbook { ref part, .. } if part == SHARED_STRINGS_PART));
    }

    #[test]
    fn test_rich_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <si>
        <r><rPr><b/></rPr><t xml:space="preserve">Hello </t></r>
        <r><t>World</t></r>
    </si>
    <si><t>東京</t><rPh sb="0" eb="2"><t>トウキョウ</t></rPh></si>
    <si><t/></si>
</sst>"#;

        let ss = SharedStrings::parse(xml).unwrap();
        assert_eq!(ss.len(), 3);
        assert_eq!(ss.get(0).unwrap(), "Hello World");
        assert_eq!(ss.get(1).unwrap(), "東京");
        assert_eq!(ss.get(2).unwrap(), "");
    }

    #[test]
    fn test_prefixed_namespace() {
        let xml = r#"<x:sst xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
            <x:si><x:t>a &lt; b</x:t></x:si></x:sst>"#;
        let ss = SharedStrings::parse(xml).unwrap().with_part("xl/strings.xml");
        assert_eq!(ss.get(0).unwrap(), "a < b");
        assert!(matches!(
            ss.get(1),
            Err(Error::CorruptWorkbook { ref part, .. }) if part == "xl/strings.xml"
        ));
    }
}
