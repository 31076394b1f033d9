//! In-memory xlsx packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Cell styles of every built workbook, by index:
/// 0 General, 1 date (14), 2 percent (10), 3 time (21), 4 `@` (49),
/// 5 custom `yyyy-mm-dd hh:mm:ss`, 6 custom `dd.mm.yyyy`.
pub const DEFAULT_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="2">
    <numFmt numFmtId="164" formatCode="yyyy-mm-dd hh:mm:ss"/>
    <numFmt numFmtId="165" formatCode="dd.mm.yyyy"/>
  </numFmts>
  <cellXfs count="7">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
    <xf numFmtId="10" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
    <xf numFmtId="21" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
    <xf numFmtId="49" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
    <xf numFmtId="164" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
    <xf numFmtId="165" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

struct SheetFixture {
    name: String,
    rows: String,
    extra: String,
    rels: Option<String>,
    hidden: bool,
}

/// Builds a minimal but well-formed xlsx package.
pub struct WorkbookBuilder {
    sheets: Vec<SheetFixture>,
    shared_strings: Vec<String>,
    styles: Option<String>,
    date1904: Option<String>,
    skip_parts: Vec<String>,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: Vec::new(),
            styles: Some(DEFAULT_STYLES.to_string()),
            date1904: None,
            skip_parts: Vec::new(),
        }
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn styles(mut self, styles: Option<&str>) -> Self {
        self.styles = styles.map(str::to_string);
        self
    }

    /// Raw value of `workbookPr/@date1904`.
    pub fn date1904(mut self, value: &str) -> Self {
        self.date1904 = Some(value.to_string());
        self
    }

    /// Add a sheet whose `<sheetData>` holds `rows`.
    pub fn sheet(self, name: &str, rows: &str) -> Self {
        self.sheet_with(name, rows, "", None)
    }

    /// Add a sheet with extra worksheet content (merges, hyperlinks) and an
    /// optional relationships part.
    pub fn sheet_with(mut self, name: &str, rows: &str, extra: &str, rels: Option<&str>) -> Self {
        self.sheets.push(SheetFixture {
            name: name.to_string(),
            rows: rows.to_string(),
            extra: extra.to_string(),
            rels: rels.map(str::to_string),
            hidden: false,
        });
        self
    }

    pub fn hidden_sheet(mut self, name: &str, rows: &str) -> Self {
        self = self.sheet(name, rows);
        if let Some(sheet) = self.sheets.last_mut() {
            sheet.hidden = true;
        }
        self
    }

    /// Leave a part out of the archive.
    pub fn without_part(mut self, part: &str) -> Self {
        self.skip_parts.push(part.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(String, String)> = Vec::new();

        let mut overrides = String::from(
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        for i in 1..=self.sheets.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }
        parts.push((
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  {}
</Types>"#,
                overrides
            ),
        ));

        parts.push((
            "_rels/.rels".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                .to_string(),
        ));

        let workbook_pr = match &self.date1904 {
            Some(value) => format!(r#"<workbookPr date1904="{}"/>"#, value),
            None => String::new(),
        };
        let sheets: String = self
            .sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| {
                let state = if sheet.hidden { r#" state="hidden""# } else { "" };
                format!(
                    r#"<sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                    escape(&sheet.name),
                    i + 1,
                    state,
                    i + 1
                )
            })
            .collect();
        parts.push((
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <fileVersion appName="xl"/>
  {}
  <sheets>{}</sheets>
</workbook>"#,
                workbook_pr, sheets
            ),
        ));

        let n = self.sheets.len();
        let mut rels: String = (1..=n)
            .map(|i| {
                format!(
                    r#"<Relationship Id="rId{0}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{0}.xml"/>"#,
                    i
                )
            })
            .collect();
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            n + 1
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            n + 2
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                rels
            ),
        ));

        if let Some(styles) = &self.styles {
            parts.push(("xl/styles.xml".to_string(), styles.clone()));
        }

        if !self.shared_strings.is_empty() {
            let items: String = self
                .shared_strings
                .iter()
                .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)))
                .collect();
            parts.push((
                "xl/sharedStrings.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
                    self.shared_strings.len(),
                    items
                ),
            ));
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            parts.push((
                format!("xl/worksheets/sheet{}.xml", i + 1),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetData>{}</sheetData>
  {}
</worksheet>"#,
                    sheet.rows, sheet.extra
                ),
            ));
            if let Some(rels) = &sheet.rels {
                parts.push((
                    format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1),
                    rels.clone(),
                ));
            }
        }

        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            for (name, content) in parts {
                if self.skip_parts.contains(&name) {
                    continue;
                }
                zip.start_file(name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A `<c>` element holding a number.
pub fn num(reference: &str, value: &str) -> String {
    format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value)
}

/// A `<c>` element holding a number with a cell style.
pub fn styled(reference: &str, style: usize, value: &str) -> String {
    format!(r#"<c r="{}" s="{}"><v>{}</v></c>"#, reference, style, value)
}

/// A `<c>` element referencing a shared string.
pub fn shared(reference: &str, index: usize) -> String {
    format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, index)
}

/// A `<c>` element with an inline string.
pub fn inline(reference: &str, text: &str) -> String {
    format!(
        r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        reference,
        escape(text)
    )
}

/// A `<row>` element.
pub fn row(number: u32, cells: &[String]) -> String {
    format!(r#"<row r="{}">{}</row>"#, number, cells.concat())
}
