//! # xlsx2csv
//!
//! Convert Office Open XML spreadsheets (.xlsx, .xlsm, .xltx) to CSV.
//!
//! Cells are rendered according to their number format: dates and times
//! become calendar strings, percentages get a `%`, integral numbers lose
//! their trailing `.0`, and text is written verbatim. Merged ranges can be
//! repeated into every covered cell, and hyperlink targets can be carried
//! into the output.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xlsx2csv::{convert_file, ConvertOptions};
//!
//! // First sheet, default settings
//! let csv = convert_file("report.xlsx", &ConvertOptions::default())?;
//! println!("{}", csv);
//!
//! // Every sheet whose name starts with Q, tab separated
//! let options = ConvertOptions::new()
//!     .with_all_sheets(true)
//!     .include_sheet("Q*")
//!     .with_delimiter("tab");
//! let tsv = convert_file("report.xlsx", &options)?;
//! # Ok::<(), xlsx2csv::Error>(())
//! ```
//!
//! ## Reusing a workbook
//!
//! ```no_run
//! use xlsx2csv::{ConvertOptions, Converter};
//!
//! let converter = Converter::open("report.xlsx")?;
//! for name in converter.workbook().sheet_names() {
//!     println!("{}", name);
//! }
//! converter.convert_to_dir("out", &ConvertOptions::new().with_all_sheets(true), false)?;
//! # Ok::<(), xlsx2csv::Error>(())
//! ```

pub mod container;
pub mod convert;
pub mod detect;
pub mod error;
pub mod render;
pub mod xlsx;
pub mod xml;

// Re-exports
pub use container::{MemoryPackage, OoxmlContainer, PackageReader, Relationship, Relationships};
pub use convert::{select_sheets, Converter};
pub use detect::{detect_package_kind, PackageKind};
pub use error::{Error, Result, SheetSelector};
pub use render::{ConvertOptions, CsvRenderer, HyperlinkStyle, LineTerminator, SheetSelection};
pub use xlsx::{FormatType, Row, SheetDescriptor, Workbook};

use std::path::Path;

/// Open a workbook file for conversion.
pub fn open(path: impl AsRef<Path>) -> Result<Converter> {
    Converter::open(path)
}

/// Convert a workbook file to CSV text.
///
/// # Example
///
/// ```no_run
/// use xlsx2csv::{convert_file, ConvertOptions};
///
/// let csv = convert_file("data.xlsx", &ConvertOptions::new().with_sheet_name("Totals"))?;
/// # Ok::<(), xlsx2csv::Error>(())
/// ```
pub fn convert_file(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<String> {
    options.validate()?;
    Converter::open(path)?.convert(options)
}

/// Convert a workbook held in memory to CSV text.
pub fn convert_bytes(data: &[u8], options: &ConvertOptions) -> Result<String> {
    options.validate()?;
    Converter::from_bytes(data.to_vec())?.convert(options)
}

/// List sheet names of a workbook file in manifest order.
pub fn sheet_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let converter = Converter::open(path)?;
    Ok(converter
        .workbook()
        .sheet_names()
        .into_iter()
        .map(String::from)
        .collect())
}
