//! Merged-cell ranges of a worksheet.

use super::reference::CellRange;
use crate::error::Result;
use crate::xml::ElementStream;
use std::collections::HashMap;

/// Merged ranges of one sheet, indexed by the rows they cover.
#[derive(Debug, Clone, Default)]
pub struct MergedRanges {
    ranges: Vec<CellRange>,
    by_row: HashMap<u32, Vec<usize>>,
}

impl MergedRanges {
    /// Collect every `<mergeCell ref="..."/>` in a worksheet.
    ///
    /// References that do not parse are skipped.
    pub fn parse(sheet_xml: &str) -> Result<Self> {
        let mut merged = Self::default();
        for node in ElementStream::new(sheet_xml, "mergeCell") {
            let node = node?;
            match node.attr("ref").and_then(CellRange::parse) {
                Some(range) => merged.push(range),
                None => log::warn!("Skipping merged range with bad reference {:?}", node.attr("ref")),
            }
        }
        Ok(merged)
    }

    fn push(&mut self, range: CellRange) {
        let index = self.ranges.len();
        for row in range.top_row..=range.bottom_row {
            self.by_row.entry(row).or_default().push(index);
        }
        self.ranges.push(range);
    }

    /// The range covering a position, if any.
    pub fn covering(&self, row: u32, col: u32) -> Option<&CellRange> {
        self.by_row
            .get(&row)?
            .iter()
            .map(|&i| &self.ranges[i])
            .find(|range| range.contains(row, col))
    }

    /// Ranges that cover some cell of `row`.
    pub fn in_row(&self, row: u32) -> impl Iterator<Item = &CellRange> {
        self.by_row
            .get(&row)
            .into_iter()
            .flatten()
            .map(|&i| &self.ranges[i])
    }

    /// Last row covered by any range.
    pub fn last_row(&self) -> Option<u32> {
        self.ranges.iter().map(|r| r.bottom_row).max()
    }

    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
