//! Conversion options.

use crate::error::{Error, Result, SheetSelector};
use crate::xlsx::datetime::is_valid_pattern;
use serde::{Deserialize, Serialize};

/// Separator written between sheets in multi-sheet output.
pub const DEFAULT_SHEET_SEPARATOR: &str = "--------";

/// Record terminator of the CSV output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
}

impl LineTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::Crlf => "\r\n",
        }
    }
}

/// How hyperlink targets appear in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HyperlinkStyle {
    /// `text [url]`
    #[default]
    Inline,
    /// `<a href='url'>text</a>`
    Html,
    /// URLs appended as extra trailing fields of the row
    Column,
}

/// Which sheets a conversion covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    /// One sheet by number or name.
    Single(SheetSelector),
    /// Every sheet, filtered by name patterns.
    All {
        include: Vec<String>,
        exclude: Vec<String>,
        skip_hidden: bool,
    },
}

/// Settings for converting a workbook to CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// 1-based sheet number to convert (default: 1)
    pub sheet_number: Option<usize>,

    /// Exact name of the sheet to convert; wins over `sheet_number`
    pub sheet_name: Option<String>,

    /// Convert every sheet
    pub all_sheets: bool,

    /// Column delimiter: a single character, or `tab` / `x09`
    pub delimiter: String,

    /// strftime pattern overriding date rendering
    pub date_format: Option<String>,

    /// strftime pattern overriding time rendering (falls back to `date_format`)
    pub time_format: Option<String>,

    /// Fixed number of decimals for plain numbers
    pub float_precision: Option<usize>,

    /// Drop rows whose fields are all empty
    pub ignore_empty_lines: bool,

    /// Write CR, LF and TAB inside fields as `\r`, `\n`, `\t`
    pub escape_control_chars: bool,

    /// Line written between sheets; empty disables it
    pub sheet_separator: String,

    /// Record terminator
    pub line_terminator: LineTerminator,

    /// Add hyperlink targets to linked cells
    pub include_hyperlinks: bool,

    /// How hyperlink targets are rendered
    pub hyperlink_style: HyperlinkStyle,

    /// Glob patterns a sheet name must match (all-sheets mode)
    pub include_sheet_patterns: Vec<String>,

    /// Glob patterns that drop a sheet (all-sheets mode)
    pub exclude_sheet_patterns: Vec<String>,

    /// Skip hidden sheets (all-sheets mode)
    pub exclude_hidden_sheets: bool,

    /// Repeat a merged range's value in every covered cell
    pub merge_cells: bool,

    /// Classify unknown custom number formats by their date/time tokens
    pub infer_custom_date_formats: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            sheet_number: None,
            sheet_name: None,
            all_sheets: false,
            delimiter: ",".to_string(),
            date_format: None,
            time_format: None,
            float_precision: None,
            ignore_empty_lines: false,
            escape_control_chars: false,
            sheet_separator: DEFAULT_SHEET_SEPARATOR.to_string(),
            line_terminator: LineTerminator::Lf,
            include_hyperlinks: false,
            hyperlink_style: HyperlinkStyle::Inline,
            include_sheet_patterns: Vec::new(),
            exclude_sheet_patterns: Vec::new(),
            exclude_hidden_sheets: false,
            merge_cells: false,
            infer_custom_date_formats: false,
        }
    }
}

impl ConvertOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a sheet by 1-based number.
    pub fn with_sheet_number(mut self, number: usize) -> Self {
        self.sheet_number = Some(number);
        self
    }

    /// Select a sheet by exact name.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    /// Convert every sheet.
    pub fn with_all_sheets(mut self, all: bool) -> Self {
        self.all_sheets = all;
        self
    }

    /// Set the column delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Override date rendering.
    pub fn with_date_format(mut self, pattern: impl Into<String>) -> Self {
        self.date_format = Some(pattern.into());
        self
    }

    /// Override time rendering.
    pub fn with_time_format(mut self, pattern: impl Into<String>) -> Self {
        self.time_format = Some(pattern.into());
        self
    }

    /// Render plain numbers with a fixed number of decimals.
    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = Some(precision);
        self
    }

    /// Drop all-empty rows.
    pub fn with_ignore_empty_lines(mut self, ignore: bool) -> Self {
        self.ignore_empty_lines = ignore;
        self
    }

    /// Escape control characters inside fields.
    pub fn with_escape_control_chars(mut self, escape: bool) -> Self {
        self.escape_control_chars = escape;
        self
    }

    /// Set the separator line between sheets.
    pub fn with_sheet_separator(mut self, separator: impl Into<String>) -> Self {
        self.sheet_separator = separator.into();
        self
    }

    /// Set the record terminator.
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// Include hyperlink targets.
    pub fn with_hyperlinks(mut self, include: bool) -> Self {
        self.include_hyperlinks = include;
        self
    }

    /// Set how hyperlinks are rendered.
    pub fn with_hyperlink_style(mut self, style: HyperlinkStyle) -> Self {
        self.hyperlink_style = style;
        self
    }

    /// Add an inclusion pattern.
    pub fn include_sheet(mut self, pattern: impl Into<String>) -> Self {
        self.include_sheet_patterns.push(pattern.into());
        self
    }

    /// Add an exclusion pattern.
    pub fn exclude_sheet(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_sheet_patterns.push(pattern.into());
        self
    }

    /// Skip hidden sheets.
    pub fn with_exclude_hidden_sheets(mut self, exclude: bool) -> Self {
        self.exclude_hidden_sheets = exclude;
        self
    }

    /// Repeat merged values.
    pub fn with_merge_cells(mut self, merge: bool) -> Self {
        self.merge_cells = merge;
        self
    }

    /// Infer types of unknown custom number formats.
    pub fn with_infer_custom_date_formats(mut self, infer: bool) -> Self {
        self.infer_custom_date_formats = infer;
        self
    }

    /// Resolve the delimiter setting to a single byte.
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_str() {
            "tab" | "x09" | "\\t" => Ok(b'\t'),
            "" => Ok(b','),
            d if d.len() == 1 && d.is_ascii() => Ok(d.as_bytes()[0]),
            d => Err(Error::InvalidOption(format!(
                "delimiter must be a single ASCII character, 'tab' or 'x09', got '{}'",
                d
            ))),
        }
    }

    /// The sheets this configuration asks for.
    pub fn selection(&self) -> SheetSelection {
        if self.all_sheets {
            SheetSelection::All {
                include: self.include_sheet_patterns.clone(),
                exclude: self.exclude_sheet_patterns.clone(),
                skip_hidden: self.exclude_hidden_sheets,
            }
        } else if let Some(name) = &self.sheet_name {
            SheetSelection::Single(SheetSelector::Name(name.clone()))
        } else {
            SheetSelection::Single(SheetSelector::Number(self.sheet_number.unwrap_or(1)))
        }
    }

    /// Check every setting before any conversion work starts.
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;

        for pattern in [&self.date_format, &self.time_format].into_iter().flatten() {
            if !is_valid_pattern(pattern) {
                return Err(Error::InvalidOption(format!(
                    "invalid date/time format '{}'",
                    pattern
                )));
            }
        }

        if self.sheet_number == Some(0) {
            return Err(Error::InvalidOption(
                "sheet numbers start at 1".to_string(),
            ));
        }

        for pattern in self
            .include_sheet_patterns
            .iter()
            .chain(&self.exclude_sheet_patterns)
        {
            globset::Glob::new(pattern)?;
        }

        Ok(())
    }

    /// Load options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidOption(format!("config: {}", e)))
    }

    /// Serialize options as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidOption(format!("config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert_eq!(options.delimiter_byte().unwrap(), b',');
        assert_eq!(options.sheet_separator, "--------");
        assert_eq!(options.line_terminator.as_str(), "\n");
        assert_eq!(
            options.selection(),
            SheetSelection::Single(SheetSelector::Number(1))
        );
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_delimiter_tokens() {
        for token in ["tab", "x09"] {
            let options = ConvertOptions::new().with_delimiter(token);
            assert_eq!(options.delimiter_byte().unwrap(), b'\t');
        }
        assert_eq!(
            ConvertOptions::new().with_delimiter(";").delimiter_byte().unwrap(),
            b';'
        );
        assert!(ConvertOptions::new().with_delimiter("::").validate().is_err());
        assert!(ConvertOptions::new().with_delimiter("§").validate().is_err());
    }

    #[test]
    fn test_selection_precedence() {
        let options = ConvertOptions::new()
            .with_sheet_number(3)
            .with_sheet_name("Data");
        assert_eq!(
            options.selection(),
            SheetSelection::Single(SheetSelector::Name("Data".to_string()))
        );

        let options = options.with_all_sheets(true).include_sheet("Q*");
        assert_eq!(
            options.selection(),
            SheetSelection::All {
                include: vec!["Q*".to_string()],
                exclude: vec![],
                skip_hidden: false,
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        assert!(matches!(
            ConvertOptions::new().with_date_format("%Y-%Q").validate(),
            Err(Error::InvalidOption(_))
        ));
        assert!(matches!(
            ConvertOptions::new().with_sheet_number(0).validate(),
            Err(Error::InvalidOption(_))
        ));
        assert!(matches!(
            ConvertOptions::new().exclude_sheet("[oops").validate(),
            Err(Error::InvalidOption(_))
        ));
    }

    #[test]
    fn test_json_config() {
        let options = ConvertOptions::from_json(
            r#"{"all_sheets": true, "delimiter": "tab", "hyperlink_style": "column", "line_terminator": "crlf"}"#,
        )
        .unwrap();
        assert!(options.all_sheets);
        assert_eq!(options.delimiter_byte().unwrap(), b'\t');
        assert_eq!(options.hyperlink_style, HyperlinkStyle::Column);
        assert_eq!(options.line_terminator, LineTerminator::Crlf);
        assert_eq!(options.sheet_separator, DEFAULT_SHEET_SEPARATOR);

        let json = options.to_json().unwrap();
        assert_eq!(ConvertOptions::from_json(&json).unwrap(), options);

        assert!(ConvertOptions::from_json("{\"all_sheets\": 3}").is_err());
    }
}
