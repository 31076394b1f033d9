//! Spreadsheet package detection.

use crate::container::PackageReader;
use crate::error::{Error, Result};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Content type for a regular workbook part.
const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Content type for a macro-enabled workbook part.
const MACRO_WORKBOOK_CONTENT_TYPE: &str = "application/vnd.ms-excel.sheet.macroEnabled.main+xml";

/// Content type for a workbook template part.
const TEMPLATE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.template.main+xml";

/// Kind of spreadsheet package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// Regular workbook (.xlsx)
    Workbook,
    /// Macro-enabled workbook (.xlsm)
    MacroEnabled,
    /// Workbook template (.xltx)
    Template,
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// Determine which kind of spreadsheet a package holds.
///
/// Inspects `[Content_Types].xml`, falling back to the presence of
/// `xl/workbook.xml`. Anything else is rejected as an invalid xlsx file.
pub fn detect_package_kind(package: &dyn PackageReader) -> Result<PackageKind> {
    if package.part_exists(CONTENT_TYPES_PART) {
        let content_types = package.read_xml(CONTENT_TYPES_PART)?;
        if content_types.contains(MACRO_WORKBOOK_CONTENT_TYPE) {
            return Ok(PackageKind::MacroEnabled);
        }
        if content_types.contains(TEMPLATE_CONTENT_TYPE) {
            return Ok(PackageKind::Template);
        }
        if content_types.contains(WORKBOOK_CONTENT_TYPE) {
            return Ok(PackageKind::Workbook);
        }
    }

    if package.part_exists("xl/workbook.xml") {
        return Ok(PackageKind::Workbook);
    }

    Err(Error::invalid_xlsx(
        CONTENT_TYPES_PART,
        "package does not contain a spreadsheet workbook",
    ))
}

/// Reject byte buffers that cannot be a ZIP package before opening them.
pub fn ensure_zip(data: &[u8]) -> Result<()> {
    if is_zip_file(data) {
        Ok(())
    } else {
        Err(Error::invalid_xlsx("<package>", "not a ZIP archive"))
    }
}
