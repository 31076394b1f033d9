//! Worksheet streaming.
//!
//! [`SheetParser::parse`] reads the merged ranges and hyperlinks of a sheet up
//! front, then hands out a [`SheetRows`] iterator that walks `<row>` elements
//! in document order. Each yielded [`Row`] is column-complete: skipped columns
//! are filled with empty strings and skipped rows come out as blank rows.

use super::cell::{Cell, RawValue, ValueFormatter};
use super::datetime::DateSystem;
use super::hyperlinks::Hyperlinks;
use super::merge::MergedRanges;
use super::number_format::NumberFormatCatalog;
use super::reference::{column_name, parse_cell_ref, MAX_COLUMN, MAX_ROW};
use super::shared_strings::{rich_text, SharedStrings};
use crate::container::Relationships;
use crate::error::{Error, Result};
use crate::render::{ConvertOptions, HyperlinkStyle};
use crate::xml::{ElementStream, XmlNode};
use std::collections::HashMap;

/// Display strings of one sheet row, one per column.
pub type Row = Vec<String>;

/// Parses worksheets of one workbook.
#[derive(Debug, Clone, Copy)]
pub struct SheetParser<'a> {
    catalog: &'a NumberFormatCatalog,
    shared_strings: &'a SharedStrings,
    options: &'a ConvertOptions,
    date_system: DateSystem,
    relationships: Option<&'a Relationships>,
    part: &'a str,
}

impl<'a> SheetParser<'a> {
    /// Create a parser over the workbook-wide tables.
    pub fn new(
        catalog: &'a NumberFormatCatalog,
        shared_strings: &'a SharedStrings,
        options: &'a ConvertOptions,
    ) -> Self {
        Self {
            catalog,
            shared_strings,
            options,
            date_system: DateSystem::default(),
            relationships: None,
            part: "worksheet",
        }
    }

    /// Set the epoch used for date cells.
    pub fn with_date_system(mut self, date_system: DateSystem) -> Self {
        self.date_system = date_system;
        self
    }

    /// Set the sheet's relationships, used to resolve hyperlinks.
    pub fn with_relationships(mut self, relationships: &'a Relationships) -> Self {
        self.relationships = Some(relationships);
        self
    }

    /// Name the part being parsed, for diagnostics.
    pub fn with_part(mut self, part: &'a str) -> Self {
        self.part = part;
        self
    }

    /// Start streaming the rows of `xml`.
    ///
    /// Each call starts over from the top of the document.
    pub fn parse(&self, xml: &'a str) -> Result<SheetRows<'a>> {
        let merges = MergedRanges::parse(xml)?;
        let hyperlinks = if self.options.include_hyperlinks {
            let empty = Relationships::new();
            Hyperlinks::parse(xml, self.relationships.unwrap_or(&empty))?
        } else {
            Hyperlinks::default()
        };
        log::debug!(
            "{}: {} merged ranges, {} hyperlinks",
            self.part,
            merges.ranges().len(),
            hyperlinks.len()
        );

        let formatter = ValueFormatter {
            date_system: self.date_system,
            date_format: self.options.date_format.as_deref(),
            time_format: self.options.time_format.as_deref(),
            float_precision: self.options.float_precision,
        };

        Ok(SheetRows {
            parser: *self,
            formatter,
            rows: ElementStream::new(xml, "row"),
            merges,
            hyperlinks,
            anchor_values: HashMap::new(),
            next_row: 0,
            pending: None,
            exhausted: false,
        })
    }
}

/// Lazy, forward-only sequence of rows of one sheet.
pub struct SheetRows<'a> {
    parser: SheetParser<'a>,
    formatter: ValueFormatter<'a>,
    rows: ElementStream<'a>,
    merges: MergedRanges,
    hyperlinks: Hyperlinks,
    /// Display values of merged-range anchors seen so far
    anchor_values: HashMap<(u32, u32), String>,
    /// Index of the next row to yield
    next_row: u32,
    /// A parsed row waiting for the gap before it to be filled
    pending: Option<(u32, Row)>,
    exhausted: bool,
}

impl SheetRows<'_> {
    fn merge_mode(&self) -> bool {
        self.parser.options.merge_cells && !self.merges.is_empty()
    }

    /// Row with no cells of its own, filled from merged ranges in merge mode.
    fn blank_row(&self, index: u32) -> Row {
        let mut row = Row::new();
        if self.merge_mode() {
            self.fill_merged(index, &mut row);
        }
        row
    }

    /// Copy anchor values into every covered, non-anchor position of `row`.
    fn fill_merged(&self, index: u32, row: &mut Row) {
        for range in self.merges.in_row(index) {
            let width = range.right_col as usize + 1;
            if row.len() < width {
                row.resize(width, String::new());
            }
            let value = self.anchor_values.get(&range.anchor());
            for col in range.left_col..=range.right_col {
                if !range.is_anchor(index, col) {
                    row[col as usize] = value.cloned().unwrap_or_default();
                }
            }
        }
    }

    /// `None` for a row numbered past the last addressable row.
    fn build_row(&mut self, node: &XmlNode) -> Result<Option<(u32, Row)>> {
        let number = node
            .attr("r")
            .and_then(|r| r.trim().parse::<u64>().ok())
            .filter(|&r| r > 0);
        let index = match number {
            Some(r) if r - 1 > u64::from(MAX_ROW) => {
                log::warn!("{}: skipping row {} beyond the sheet limit", self.parser.part, r);
                return Ok(None);
            }
            Some(r) => (r - 1) as u32,
            None => self.next_row,
        };

        let mut values: Vec<(u32, String)> = Vec::new();
        let mut link_columns: Vec<String> = Vec::new();
        let mut next_col = 0u32;

        for element in node.children_named("c") {
            let column = element
                .attr("r")
                .and_then(parse_cell_ref)
                .map(|(_, col)| col)
                .unwrap_or(next_col);
            if column > MAX_COLUMN {
                continue;
            }
            next_col = column + 1;

            let cell = self.read_cell(element, index, column)?;
            let mut display = self.display(&cell);

            if let Some(url) = &cell.hyperlink {
                match self.parser.options.hyperlink_style {
                    HyperlinkStyle::Inline if display.is_empty() => display = url.clone(),
                    HyperlinkStyle::Inline => display = format!("{} [{}]", display, url),
                    HyperlinkStyle::Html => display = format!("<a href='{}'>{}</a>", url, display),
                    HyperlinkStyle::Column => link_columns.push(url.clone()),
                }
            }

            match self.merges.covering(index, column) {
                Some(range) if range.is_anchor(index, column) => {
                    self.anchor_values.insert(range.anchor(), display.clone());
                }
                // Covered cells only ever show their anchor's value.
                Some(_) => display.clear(),
                None => {}
            }
            values.push((column, display));
        }

        let width = values.iter().map(|(col, _)| *col as usize + 1).max().unwrap_or(0);
        let mut row = vec![String::new(); width];
        for (col, display) in values {
            row[col as usize] = display;
        }
        if self.merge_mode() {
            self.fill_merged(index, &mut row);
        }
        row.extend(link_columns);

        Ok(Some((index, row)))
    }

    fn read_cell(&self, element: &XmlNode, row: u32, column: u32) -> Result<Cell> {
        let style_index = element
            .attr("s")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let value = element.child("v").map(|v| v.text());

        let raw = match element.attr("t").unwrap_or("n") {
            "s" => match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => {
                    let string_index: usize = v.parse().map_err(|_| {
                        Error::corrupt(
                            self.parser.part,
                            format!(
                                "cell {}{}: shared string reference '{}' is not an index",
                                column_name(column),
                                row + 1,
                                v
                            ),
                        )
                    })?;
                    RawValue::Text(self.parser.shared_strings.get(string_index)?.to_string())
                }
                None => RawValue::Empty,
            },
            "inlineStr" => match element.child("is") {
                Some(is) => RawValue::Text(rich_text(is)),
                None => RawValue::Text(value.unwrap_or_default().to_string()),
            },
            "b" => match value.map(str::trim) {
                Some(v) => RawValue::Bool(v == "1" || v.eq_ignore_ascii_case("true")),
                None => RawValue::Empty,
            },
            "e" => RawValue::Error(value.unwrap_or_default().to_string()),
            "str" | "d" => RawValue::Text(value.unwrap_or_default().to_string()),
            _ => match value.filter(|v| !v.trim().is_empty()) {
                Some(v) => RawValue::Number(v.to_string()),
                None => RawValue::Empty,
            },
        };

        let resolved_type = self
            .parser
            .catalog
            .format(style_index)
            .semantic_type(self.parser.options.infer_custom_date_formats);
        let hyperlink = if self.hyperlinks.is_empty() {
            None
        } else {
            self.hyperlinks.get(row, column).map(str::to_string)
        };

        Ok(Cell {
            row,
            column,
            raw,
            style_index,
            resolved_type,
            hyperlink,
        })
    }

    fn display(&self, cell: &Cell) -> String {
        let format = self.parser.catalog.format(cell.style_index);
        match self.formatter.display(&cell.raw, format, cell.resolved_type) {
            Some(display) => display,
            None => {
                log::warn!(
                    "{}: cell {}{} has malformed numeric value {:?}",
                    self.parser.part,
                    column_name(cell.column),
                    cell.row + 1,
                    cell.raw
                );
                String::new()
            }
        }
    }

    /// Yield the next row, filling the gap before a pending row first.
    fn take_pending(&mut self) -> Option<Row> {
        let (index, _) = self.pending.as_ref()?;
        let index = *index;
        if self.next_row < index {
            let blank = self.blank_row(self.next_row);
            self.next_row += 1;
            return Some(blank);
        }
        let (_, row) = self.pending.take()?;
        self.next_row = self.next_row.max(index + 1);
        Some(row)
    }
}

impl Iterator for SheetRows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.take_pending() {
                return Some(Ok(row));
            }

            if self.exhausted {
                // Merged ranges can reach below the last stored row.
                let last = self.merges.last_row()?;
                if self.merge_mode() && self.next_row <= last {
                    let blank = self.blank_row(self.next_row);
                    self.next_row += 1;
                    return Some(Ok(blank));
                }
                return None;
            }

            match self.rows.next() {
                Some(Ok(node)) => match self.build_row(&node) {
                    Ok(parsed) => self.pending = parsed,
                    Err(e) => {
                        self.exhausted = true;
                        self.merges = MergedRanges::default();
                        return Some(Err(e));
                    }
                },
                Some(Err(e)) => {
                    self.exhausted = true;
                    self.merges = MergedRanges::default();
                    return Some(Err(e));
                }
                None => self.exhausted = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
        <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
        <cellXfs count="5">
            <xf numFmtId="0"/>
            <xf numFmtId="14"/>
            <xf numFmtId="9"/>
            <xf numFmtId="21"/>
            <xf numFmtId="49"/>
        </cellXfs>
    </styleSheet>"#;

    const STRINGS: &str = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
        <si><t>Name</t></si><si><t>Alice, Jr.</t></si><si><t>X</t></si>
    </sst>"#;

    fn sheet(rows: &str, extra: &str) -> String {
        format!(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
    xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>{}</sheetData>{}</worksheet>"#,
            rows, extra
        )
    }

    fn rows_of(xml: &str, options: &ConvertOptions) -> Vec<Row> {
        let catalog = NumberFormatCatalog::parse(STYLES).unwrap();
        let strings = SharedStrings::parse(STRINGS).unwrap();
        let parser = SheetParser::new(&catalog, &strings, options);
        parser
            .parse(xml)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn row(values: &[&str]) -> Row {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_typed_cells() {
        let xml = sheet(
            r#"<row r="1">
                <c r="A1" t="s"><v>0</v></c>
                <c r="B1"><v>42</v></c>
                <c r="C1" s="1"><v>44197</v></c>
                <c r="D1" s="2"><v>0.25</v></c>
                <c r="E1" s="3"><v>0.5</v></c>
                <c r="F1" t="b"><v>1</v></c>
                <c r="G1" t="inlineStr"><is><t>inline</t></is></c>
                <c r="H1" t="e"><v>#DIV/0!</v></c>
                <c r="I1" s="4"><v>007</v></c>
            </row>"#,
            "",
        );
        let rows = rows_of(&xml, &ConvertOptions::default());
        assert_eq!(
            rows,
            vec![row(&[
                "Name",
                "42",
                "2021-01-01",
                "25%",
                "12:00:00",
                "TRUE",
                "inline",
                "#DIV/0!",
                "7"
            ])]
        );
    }

    #[test]
    fn test_column_and_row_gaps() {
        let xml = sheet(
            r#"<row r="2"><c r="C2"><v>1</v></c></row>
               <row r="4"><c r="A4"><v>2</v></c></row>"#,
            "",
        );
        let rows = rows_of(&xml, &ConvertOptions::default());
        assert_eq!(
            rows,
            vec![row(&[]), row(&["", "", "1"]), row(&[]), row(&["2"])]
        );
    }

    #[test]
    fn test_missing_references_follow_previous() {
        let xml = sheet(
            r#"<row><c><v>1</v></c><c><v>2</v></c></row><row><c r="B2"><v>3</v></c><c><v>4</v></c></row>"#,
            "",
        );
        let rows = rows_of(&xml, &ConvertOptions::default());
        assert_eq!(rows, vec![row(&["1", "2"]), row(&["", "3", "4"])]);
    }

    #[test]
    fn test_merged_cells() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>1</v></c></row>
               <row r="2"><c r="A2"><v>2</v></c><c r="B2" t="s"><v>2</v></c></row>
               <row r="3"><c r="A3"><v>3</v></c><c r="B3"/></row>"#,
            r#"<mergeCells count="1"><mergeCell ref="B2:B3"/></mergeCells>"#,
        );

        let merged = rows_of(&xml, &ConvertOptions::new().with_merge_cells(true));
        assert_eq!(merged, vec![row(&["1"]), row(&["2", "X"]), row(&["3", "X"])]);

        let plain = rows_of(&xml, &ConvertOptions::default());
        assert_eq!(plain, vec![row(&["1"]), row(&["2", "X"]), row(&["3", ""])]);
    }

    #[test]
    fn test_merged_range_below_last_row() {
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>2</v></c></row>"#,
            r#"<mergeCells><mergeCell ref="A1:B3"/></mergeCells>"#,
        );
        let merged = rows_of(&xml, &ConvertOptions::new().with_merge_cells(true));
        assert_eq!(
            merged,
            vec![row(&["X", "X"]), row(&["X", "X"]), row(&["X", "X"])]
        );
        let plain = rows_of(&xml, &ConvertOptions::default());
        assert_eq!(plain, vec![row(&["X"])]);
    }

    #[test]
    fn test_rows_past_sheet_limit_are_skipped() {
        let xml = sheet(
            r#"<row r="1"><c r="A1"><v>1</v></c></row>
               <row r="4000000000"><c r="A4000000000"><v>2</v></c></row>
               <row r="2"><c r="A2"><v>3</v></c></row>"#,
            r#"<mergeCells><mergeCell ref="A1:A4000000000"/></mergeCells>"#,
        );
        let merged = rows_of(&xml, &ConvertOptions::new().with_merge_cells(true));
        assert_eq!(merged, vec![row(&["1"]), row(&["3"])]);
    }

    #[test]
    fn test_malformed_number_is_blank() {
        let xml = sheet(r#"<row r="1"><c r="A1"><v>abc</v></c><c r="B1"><v>5</v></c></row>"#, "");
        let rows = rows_of(&xml, &ConvertOptions::default());
        assert_eq!(rows, vec![row(&["", "5"])]);
    }

    #[test]
    fn test_bad_shared_string_index() {
        let catalog = NumberFormatCatalog::default();
        let strings = SharedStrings::parse(STRINGS).unwrap();
        let options = ConvertOptions::default();
        let xml = sheet(r#"<row r="1"><c r="A1" t="s"><v>9</v></c></row>"#, "");
        let result: Result<Vec<Row>> = SheetParser::new(&catalog, &strings, &options)
            .parse(&xml)
            .unwrap()
            .collect();
        assert!(matches!(result, Err(Error::CorruptWorkbook { .. })));
    }

    #[test]
    fn test_hyperlink_styles() {
        let rels = Relationships::parse(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
            </Relationships>"#,
        )
        .unwrap();
        let xml = sheet(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>7</v></c></row>"#,
            r#"<hyperlinks><hyperlink ref="A1" r:id="rId1"/></hyperlinks>"#,
        );
        let catalog = NumberFormatCatalog::default();
        let strings = SharedStrings::parse(STRINGS).unwrap();

        let render = |style: HyperlinkStyle| -> Vec<Row> {
            let options = ConvertOptions::new()
                .with_hyperlinks(true)
                .with_hyperlink_style(style);
            SheetParser::new(&catalog, &strings, &options)
                .with_relationships(&rels)
                .parse(&xml)
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap()
        };

        assert_eq!(
            render(HyperlinkStyle::Inline),
            vec![row(&["Name [https://example.com/]", "7"])]
        );
        assert_eq!(
            render(HyperlinkStyle::Html),
            vec![row(&["<a href='https://example.com/'>Name</a>", "7"])]
        );
        assert_eq!(
            render(HyperlinkStyle::Column),
            vec![row(&["Name", "7", "https://example.com/"])]
        );

        // links are ignored unless requested
        assert_eq!(rows_of(&xml, &ConvertOptions::default()), vec![row(&["Name", "7"])]);
    }

    #[test]
    fn test_date_system_and_overrides() {
        let xml = sheet(r#"<row r="1"><c r="A1" s="1"><v>0</v></c></row>"#, "");
        let catalog = NumberFormatCatalog::parse(STYLES).unwrap();
        let strings = SharedStrings::default();
        let options = ConvertOptions::new().with_date_format("%d.%m.%Y");
        let rows: Vec<Row> = SheetParser::new(&catalog, &strings, &options)
            .with_date_system(DateSystem::Epoch1904)
            .parse(&xml)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows, vec![row(&["01.01.1904"])]);
    }

    #[test]
    fn test_parse_is_restartable() {
        let xml = sheet(r#"<row r="1"><c r="A1"><v>1.5</v></c></row>"#, "");
        let options = ConvertOptions::default();
        assert_eq!(rows_of(&xml, &options), rows_of(&xml, &options));
    }
}
