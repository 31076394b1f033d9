//! CSV output.
//!
//! [`ConvertOptions`] carries every conversion setting; [`CsvRenderer`]
//! serializes rows with the configured delimiter, quoting, escaping, and
//! line terminator.
//!
//! # Example
//!
//! ```
//! use xlsx2csv::render::{ConvertOptions, CsvRenderer};
//!
//! let options = ConvertOptions::new().with_delimiter(";");
//! let renderer = CsvRenderer::new(&options)?;
//! let csv = renderer.render(vec![Ok(vec!["a;b".to_string(), "c".to_string()])])?;
//! assert_eq!(csv, "\"a;b\";c\n");
//! # Ok::<(), xlsx2csv::Error>(())
//! ```

mod csv;
mod options;

pub use self::csv::{escape_control_chars, CsvRenderer};
pub use options::{
    ConvertOptions, HyperlinkStyle, LineTerminator, SheetSelection, DEFAULT_SHEET_SEPARATOR,
};
