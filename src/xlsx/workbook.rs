//! Workbook manifest (xl/workbook.xml) parsing.

use crate::container::{resolve_path, PackageReader, Relationships};
use crate::error::{Error, Result};
use crate::xml::XmlNode;

use super::datetime::DateSystem;

/// Default location of the workbook manifest.
pub const WORKBOOK_PART: &str = "xl/workbook.xml";

const OFFICE_DOCUMENT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Producer identity of workbooks whose relationship ids carry the sheet id.
const XL_APP_NAME: &str = "xl";

/// One sheet listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDescriptor {
    /// Sheet name as shown on its tab.
    pub name: String,
    /// Sheet id resolved from `sheetId` / `r:id`.
    pub id: u32,
    /// 1-based position in the manifest.
    pub index: usize,
    /// Relationship id (`r:id`), if present.
    pub relationship_id: Option<String>,
    /// Package path of the sheet's XML part.
    pub target: String,
    /// Whether the sheet is hidden or very hidden.
    pub hidden: bool,
}

/// Parsed workbook manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    /// Sheets in manifest order.
    pub sheets: Vec<SheetDescriptor>,
    /// Whether dates count from 1904-01-01.
    pub date1904: bool,
    /// Producer identity from `fileVersion/@appName`, or `unknown`.
    pub app_name: String,
    /// Part the manifest was read from.
    pub part: String,
}

impl Workbook {
    /// Parse the manifest XML.
    ///
    /// Sheet targets default to `xl/worksheets/sheet{id}.xml` until
    /// relationships are applied.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_part(xml, WORKBOOK_PART)
    }

    fn parse_part(xml: &str, part: &str) -> Result<Self> {
        let root = XmlNode::parse(xml).map_err(|e| Error::invalid_xlsx(part, e.to_string()))?;
        if root.local_name() != "workbook" {
            return Err(Error::invalid_xlsx(
                part,
                format!("unexpected root element <{}>", root.name()),
            ));
        }

        let app_name = root
            .find("fileVersion")
            .and_then(|node| node.attr("appName"))
            .unwrap_or("unknown")
            .to_string();

        let date1904 = read_date1904(&root);

        let sheets_node = root
            .find("sheets")
            .ok_or_else(|| Error::invalid_xlsx(part, "no <sheets> element"))?;

        let mut sheets = Vec::new();
        for node in sheets_node.children_named("sheet") {
            let Some(name) = node.attr("name") else {
                log::warn!("{}: skipping sheet without a name", part);
                continue;
            };
            let Some(id) = resolve_sheet_id(node, &app_name) else {
                log::warn!("{}: skipping sheet '{}' without a resolvable id", part, name);
                continue;
            };
            let hidden = node
                .attr("state")
                .is_some_and(|state| state == "hidden" || state == "veryHidden");

            sheets.push(SheetDescriptor {
                name: name.to_string(),
                id,
                index: sheets.len() + 1,
                relationship_id: node.attr("id").map(str::to_string),
                target: resolve_path(part, &format!("worksheets/sheet{}.xml", id)),
                hidden,
            });
        }

        log::debug!(
            "{}: {} sheets, appName={}, date1904={}",
            part,
            sheets.len(),
            app_name,
            date1904
        );

        Ok(Self {
            sheets,
            date1904,
            app_name,
            part: part.to_string(),
        })
    }

    /// Locate, parse, and resolve the manifest of a package.
    ///
    /// The manifest is found through the package relationships, falling back
    /// to `xl/workbook.xml`; sheet targets are resolved through the manifest's
    /// own relationships.
    pub fn from_package(package: &dyn PackageReader) -> Result<Self> {
        let part = manifest_part(package)?;
        if !package.part_exists(&part) {
            return Err(Error::invalid_xlsx(&part, "workbook manifest is missing"));
        }
        let xml = package
            .read_xml(&part)
            .map_err(|e| Error::invalid_xlsx(&part, e.to_string()))?;

        let mut workbook = Self::parse_part(&xml, &part)?;
        let rels = package.read_relationships(&part)?;
        workbook.apply_relationships(&rels);
        Ok(workbook)
    }

    fn apply_relationships(&mut self, rels: &Relationships) {
        for sheet in &mut self.sheets {
            let Some(rel) = sheet.relationship_id.as_deref().and_then(|id| rels.get(id)) else {
                continue;
            };
            if !rel.target.is_empty() {
                sheet.target = resolve_path(&self.part, &rel.target);
            }
        }
    }

    /// Epoch convention for date cells.
    pub fn date_system(&self) -> DateSystem {
        DateSystem::from_date1904(self.date1904)
    }

    /// Find a sheet by exact name.
    pub fn sheet_by_name(&self, name: &str) -> Option<&SheetDescriptor> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Find a sheet by 1-based position.
    pub fn sheet_by_number(&self, number: usize) -> Option<&SheetDescriptor> {
        number.checked_sub(1).and_then(|i| self.sheets.get(i))
    }

    /// Sheet names in manifest order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

fn manifest_part(package: &dyn PackageReader) -> Result<String> {
    let rels = package.read_relationships("")?;
    let target = rels
        .by_id
        .values()
        .find(|rel| rel.rel_type == OFFICE_DOCUMENT_REL_TYPE)
        .map(|rel| resolve_path("", &rel.target));
    Ok(target.unwrap_or_else(|| WORKBOOK_PART.to_string()))
}

/// `workbookPr/@date1904`: anything but a literal `false` selects the 1904
/// epoch; a missing attribute or element keeps 1900.
fn read_date1904(root: &XmlNode) -> bool {
    root.find("workbookPr")
        .and_then(|pr| pr.attr("date1904"))
        .map(|value| value.trim().to_lowercase() != "false")
        .unwrap_or(false)
}

/// Resolve a sheet's id.
///
/// Workbooks from the `xl` producer take the id from the relationship id's
/// numeric suffix (`rId3` -> 3); everyone else prefers `sheetId` and falls
/// back to that suffix.
fn resolve_sheet_id(node: &XmlNode, app_name: &str) -> Option<u32> {
    let rel_suffix = || -> Option<u32> {
        node.attr("id")
            .and_then(|rid| rid.get(3..))
            .and_then(|n| n.parse().ok())
    };
    let sheet_id = || -> Option<u32> { node.attr("sheetId").and_then(|n| n.trim().parse().ok()) };

    let rid_len = node.attr("id").map_or(0, |rid| rid.len());
    if app_name == XL_APP_NAME && rid_len > 2 {
        rel_suffix()
    } else if node.has_attr("sheetId") {
        sheet_id()
    } else {
        rel_suffix()
    }
}
