//! Worksheet hyperlinks.
//!
//! A `<hyperlink>` element ties a cell (or block of cells) to either an
//! external target stored in the sheet's relationship part (`r:id`) or an
//! internal `location` such as `Sheet2!A1`.

use super::reference::CellRange;
use crate::container::Relationships;
use crate::error::Result;
use crate::xml::ElementStream;
use std::collections::HashMap;

/// Hyperlink targets of one sheet.
#[derive(Debug, Clone, Default)]
pub struct Hyperlinks {
    cells: HashMap<(u32, u32), String>,
    ranges: Vec<(CellRange, String)>,
}

impl Hyperlinks {
    /// Collect hyperlinks, resolving `r:id` through the sheet's relationships.
    pub fn parse(sheet_xml: &str, rels: &Relationships) -> Result<Self> {
        let mut links = Self::default();
        for node in ElementStream::new(sheet_xml, "hyperlink") {
            let node = node?;
            let Some(range) = node.attr("ref").and_then(CellRange::parse) else {
                continue;
            };

            let external = match node.attr("id").filter(|id| !id.is_empty()) {
                Some(id) => match rels.get(id) {
                    Some(rel) => Some(rel.target.clone()),
                    None => {
                        log::warn!("Hyperlink {} points to missing relationship {}", range, id);
                        None
                    }
                },
                None => None,
            };
            let location = node.attr("location").filter(|l| !l.is_empty());

            let target = match (external, location) {
                (Some(url), Some(location)) => format!("{}#{}", url, location),
                (Some(url), None) => url,
                (None, Some(location)) => format!("#{}", location),
                (None, None) => continue,
            };
            links.insert(range, target);
        }
        Ok(links)
    }

    /// Register a target for a range.
    pub fn insert(&mut self, range: CellRange, target: impl Into<String>) {
        let target = target.into();
        if range.is_single_cell() {
            self.cells.insert(range.anchor(), target);
        } else {
            self.ranges.push((range, target));
        }
    }

    /// Target of the cell at `(row, col)`.
    pub fn get(&self, row: u32, col: u32) -> Option<&str> {
        self.cells
            .get(&(row, col))
            .or_else(|| {
                self.ranges
                    .iter()
                    .find(|(range, _)| range.contains(row, col))
                    .map(|(_, target)| target)
            })
            .map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len() + self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::reference::parse_cell_ref;

    fn target<'a>(links: &'a Hyperlinks, reference: &str) -> Option<&'a str> {
        let (row, col) = parse_cell_ref(reference)?;
        links.get(row, col)
    }

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.org/docs" TargetMode="External"/>
</Relationships>"#;

    const SHEET: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
    xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheetData/>
    <hyperlinks>
        <hyperlink ref="A1" r:id="rId1"/>
        <hyperlink ref="B2:C3" r:id="rId2" location="intro"/>
        <hyperlink ref="D4" location="Sheet2!A1"/>
        <hyperlink ref="E5" r:id="rId9"/>
    </hyperlinks>
</worksheet>"#;

    #[test]
    fn test_resolve_targets() {
        let rels = Relationships::parse(RELS).unwrap();
        let links = Hyperlinks::parse(SHEET, &rels).unwrap();

        assert_eq!(links.len(), 3);
        assert_eq!(target(&links, "A1"), Some("https://example.com/"));
        assert_eq!(target(&links, "C3"), Some("https://example.org/docs#intro"));
        assert_eq!(target(&links, "D4"), Some("#Sheet2!A1"));
        assert_eq!(target(&links, "E5"), None);
        assert_eq!(target(&links, "A2"), None);
    }

    #[test]
    fn test_no_relationships() {
        let links = Hyperlinks::parse(SHEET, &Relationships::new()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links.get(3, 3), Some("#Sheet2!A1"));
    }
}
