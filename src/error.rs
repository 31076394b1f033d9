//! Error types for the xlsx2csv library.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for xlsx2csv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How a single sheet was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// 1-based position in the workbook manifest.
    Number(usize),
    /// Exact sheet name.
    Name(String),
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Number(n) => write!(f, "sheet #{}", n),
            SheetSelector::Name(name) => write!(f, "sheet '{}'", name),
        }
    }
}

/// Errors that can occur while converting a workbook.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// The package is not a readable spreadsheet.
    #[error("Invalid xlsx file: {part}: {reason}")]
    InvalidXlsxFile { part: String, reason: String },

    /// The requested sheet does not exist, or its part is missing.
    #[error("Sheet not found: {0}")]
    SheetNotFound(SheetSelector),

    /// A cross-reference inside the package points nowhere.
    #[error("Corrupt workbook: {part}: {detail}")]
    CorruptWorkbook { part: String, detail: String },

    /// The output destination already exists.
    #[error("Output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// The conversion settings cannot be used.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Error writing CSV records.
    #[error("CSV write error: {0}")]
    Csv(String),
}

impl Error {
    pub(crate) fn invalid_xlsx(part: &str, reason: impl Into<String>) -> Self {
        Error::InvalidXlsxFile {
            part: part.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(part: &str, detail: impl Into<String>) -> Self {
        Error::CorruptWorkbook {
            part: part.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io_err) = err.into_kind() {
                return Error::Io(io_err);
            }
            return Error::Csv("I/O failure".to_string());
        }
        Error::Csv(err.to_string())
    }
}

impl From<globset::Error> for Error {
    fn from(err: globset::Error) -> Self {
        Error::InvalidOption(format!("sheet pattern: {}", err))
    }
}
