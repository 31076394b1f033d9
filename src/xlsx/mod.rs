//! SpreadsheetML parts.
//!
//! The workbook-wide tables ([`Workbook`], [`SharedStrings`],
//! [`NumberFormatCatalog`]) are read once per conversion; each worksheet is
//! then streamed row by row through [`SheetParser`].
//!
//! # Example
//!
//! ```
//! use xlsx2csv::render::ConvertOptions;
//! use xlsx2csv::xlsx::{NumberFormatCatalog, SharedStrings, SheetParser};
//!
//! let catalog = NumberFormatCatalog::default();
//! let strings = SharedStrings::default();
//! let options = ConvertOptions::default();
//! let xml = r#"<worksheet><sheetData><row r="1"><c r="B1"><v>42</v></c></row></sheetData></worksheet>"#;
//!
//! let rows = SheetParser::new(&catalog, &strings, &options)
//!     .parse(xml)?
//!     .collect::<xlsx2csv::Result<Vec<_>>>()?;
//! assert_eq!(rows, vec![vec!["".to_string(), "42".to_string()]]);
//! # Ok::<(), xlsx2csv::Error>(())
//! ```

pub mod cell;
pub mod datetime;
pub mod hyperlinks;
pub mod merge;
pub mod number_format;
pub mod reference;
mod shared_strings;
mod sheet;
mod workbook;

pub use cell::{Cell, RawValue, ValueFormatter};
pub use datetime::DateSystem;
pub use hyperlinks::Hyperlinks;
pub use merge::MergedRanges;
pub use number_format::{FormatType, NumberFormat, NumberFormatCatalog};
pub use reference::CellRange;
pub use shared_strings::{SharedStrings, SHARED_STRINGS_PART};
pub use sheet::{Row, SheetParser, SheetRows};
pub use workbook::{SheetDescriptor, Workbook, WORKBOOK_PART};
