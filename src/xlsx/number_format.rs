//! Number formats from xl/styles.xml and their semantic classification.

use crate::error::Result;
use crate::xml::XmlNode;
use std::borrow::Cow;
use std::collections::HashMap;

/// What a number format makes of a numeric cell value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Plain number, rendered in its most compact decimal form.
    #[default]
    General,
    /// Fraction rendered as a percentage.
    Percentage,
    /// Day serial rendered as a calendar date (possibly with a time).
    Date,
    /// Day fraction rendered as a time of day.
    Time,
    /// Raw value rendered verbatim.
    Text,
}

/// Built-in number formats, keyed by numFmtId.
static STANDARD_FORMATS: &[(u32, &str)] = &[
    (0, "general"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00e+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm am/pm"),
    (19, "h:mm:ss am/pm"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0e+0"),
    (49, "@"),
];

/// Known lower-cased format codes and what they mean.
static KNOWN_FORMATS: &[(&str, FormatType)] = &[
    ("general", FormatType::General),
    ("0", FormatType::General),
    ("0.00", FormatType::General),
    ("#,##0", FormatType::General),
    ("#,##0.00", FormatType::General),
    ("0%", FormatType::Percentage),
    ("0.00%", FormatType::Percentage),
    ("0.00e+00", FormatType::General),
    ("mm-dd-yy", FormatType::Date),
    ("d-mmm-yy", FormatType::Date),
    ("d-mmm", FormatType::Date),
    ("mmm-yy", FormatType::Date),
    ("h:mm am/pm", FormatType::Date),
    ("h:mm:ss am/pm", FormatType::Date),
    ("h:mm", FormatType::Time),
    ("h:mm:ss", FormatType::Time),
    ("m/d/yy h:mm", FormatType::Date),
    ("#,##0 ;(#,##0)", FormatType::General),
    ("#,##0 ;[red](#,##0)", FormatType::General),
    ("#,##0.00;(#,##0.00)", FormatType::General),
    ("#,##0.00;[red](#,##0.00)", FormatType::General),
    ("mm:ss", FormatType::Time),
    ("[h]:mm:ss", FormatType::Time),
    ("mmss.0", FormatType::Time),
    ("##0.0e+0", FormatType::General),
    ("@", FormatType::General),
    (r"yyyy\-mm\-dd", FormatType::Date),
    ("dd/mm/yy", FormatType::Date),
    ("hh:mm:ss", FormatType::Time),
    (r"dd/mm/yy\ hh:mm", FormatType::Date),
    ("dd/mm/yyyy hh:mm:ss", FormatType::Date),
    ("yy-mm-dd", FormatType::Date),
    ("d-mmm-yyyy", FormatType::Date),
    ("m/d/yy", FormatType::Date),
    ("m/d/yyyy", FormatType::Date),
    ("dd-mmm-yyyy", FormatType::Date),
    ("dd/mm/yyyy", FormatType::Date),
    ("mm/dd/yy hh:mm am/pm", FormatType::Date),
    ("mm/dd/yyyy hh:mm:ss", FormatType::Date),
    ("yyyy-mm-dd hh:mm:ss", FormatType::Date),
];

/// Format code of a built-in numFmtId.
pub fn standard_format(id: u32) -> Option<&'static str> {
    STANDARD_FORMATS
        .iter()
        .find(|(fmt_id, _)| *fmt_id == id)
        .map(|(_, code)| *code)
}

/// Exact, case-insensitive lookup of a format code in the known table.
pub fn classify_code(code: &str) -> Option<FormatType> {
    let lower = code.to_lowercase();
    KNOWN_FORMATS
        .iter()
        .find(|(known, _)| *known == lower)
        .map(|(_, format_type)| *format_type)
}

/// Guess the type of an unknown custom code from its date/time tokens.
///
/// Quoted literals, bracketed sections other than elapsed-time markers
/// (`[h]`, `[mm]`, `[ss]`), and backslash-escaped characters are skipped.
pub fn infer_code_type(code: &str) -> FormatType {
    let lower = code.to_lowercase();
    // Only the positive section decides the type
    let section = lower.split(';').next().unwrap_or_default();

    let mut has_date = false;
    let mut has_time = false;
    let mut has_month_or_minute = false;
    let mut chars = section.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' => {
                chars.next();
            }
            '[' => {
                let mut inner = String::new();
                for b in chars.by_ref() {
                    if b == ']' {
                        break;
                    }
                    inner.push(b);
                }
                if !inner.is_empty() && inner.chars().all(|t| matches!(t, 'h' | 'm' | 's')) {
                    has_time = true;
                }
            }
            'd' | 'y' => has_date = true,
            'h' | 's' => has_time = true,
            'm' => has_month_or_minute = true,
            '%' => return FormatType::Percentage,
            '@' => return FormatType::Text,
            _ => {}
        }
    }

    if has_date {
        FormatType::Date
    } else if has_time {
        FormatType::Time
    } else if has_month_or_minute {
        // a lone `m`/`mmm` token is a month
        FormatType::Date
    } else {
        FormatType::General
    }
}

/// A resolved number format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    /// Lower-cased format code.
    pub code: Cow<'static, str>,
    /// Type from the known-format table; `General` when unmatched.
    pub format_type: FormatType,
    /// Type guessed from the code's tokens, used when inference is enabled.
    inferred_type: FormatType,
}

static GENERAL_FORMAT: NumberFormat = NumberFormat {
    code: Cow::Borrowed("general"),
    format_type: FormatType::General,
    inferred_type: FormatType::General,
};

impl NumberFormat {
    /// Build a format from its code.
    pub fn from_code(code: &str) -> Self {
        let known = classify_code(code);
        Self {
            code: Cow::Owned(code.to_lowercase()),
            format_type: known.unwrap_or_default(),
            inferred_type: known.unwrap_or_else(|| infer_code_type(code)),
        }
    }

    /// The general format.
    pub fn general() -> &'static NumberFormat {
        &GENERAL_FORMAT
    }

    /// Semantic type, optionally falling back to token inference for codes
    /// missing from the known table.
    pub fn semantic_type(&self, infer: bool) -> FormatType {
        if infer {
            self.inferred_type
        } else {
            self.format_type
        }
    }

    /// Whether the code shows a time of day next to the date.
    pub fn shows_time(&self) -> bool {
        let mut in_quote = false;
        let mut in_bracket = false;
        for c in self.code.chars() {
            match c {
                '"' => in_quote = !in_quote,
                '[' if !in_quote => in_bracket = true,
                ']' if !in_quote => in_bracket = false,
                'h' | 's' if !in_quote && !in_bracket => return true,
                _ => {}
            }
        }
        false
    }
}

/// Maps cell style indices to number formats.
///
/// Built once per workbook from the `numFmts` and `cellXfs` collections of
/// xl/styles.xml; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct NumberFormatCatalog {
    /// Custom number formats: numFmtId -> formatCode
    custom: HashMap<u32, String>,
    /// Cell style formats: style index -> resolved format
    cell_formats: Vec<NumberFormat>,
}

impl NumberFormatCatalog {
    /// Parse styles from xl/styles.xml content.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = XmlNode::parse(xml)?;
        let mut catalog = Self::default();

        if let Some(num_fmts) = root.child("numFmts") {
            for num_fmt in num_fmts.children_named("numFmt") {
                let id = num_fmt.attr("numFmtId").and_then(|v| v.trim().parse().ok());
                if let (Some(id), Some(code)) = (id, num_fmt.attr("formatCode")) {
                    catalog.custom.insert(id, code.to_string());
                }
            }
        }

        if let Some(cell_xfs) = root.child("cellXfs") {
            for xf in cell_xfs.children_named("xf") {
                let num_fmt_id = xf
                    .attr("numFmtId")
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                let format = catalog.format_for_id(num_fmt_id);
                catalog.cell_formats.push(format);
            }
        }

        log::debug!(
            "styles: {} custom number formats, {} cell formats",
            catalog.custom.len(),
            catalog.cell_formats.len()
        );
        Ok(catalog)
    }

    fn format_for_id(&self, num_fmt_id: u32) -> NumberFormat {
        if let Some(code) = self.custom.get(&num_fmt_id) {
            return NumberFormat::from_code(code);
        }
        match standard_format(num_fmt_id) {
            Some(code) => NumberFormat::from_code(code),
            None => NumberFormat::general().clone(),
        }
    }

    /// Number format of a cell style; unknown indices resolve to General.
    pub fn format(&self, style_index: usize) -> &NumberFormat {
        match self.cell_formats.get(style_index) {
            Some(format) => format,
            None => {
                if style_index > 0 {
                    log::debug!("style index {} not found, using General", style_index);
                }
                NumberFormat::general()
            }
        }
    }

    /// Semantic type of a cell style, from the known-format table only.
    pub fn classify(&self, style_index: usize) -> FormatType {
        self.format(style_index).format_type
    }

    /// Number of cell formats.
    pub fn len(&self) -> usize {
        self.cell_formats.len()
    }

    /// Whether the catalog has no cell formats.
    pub fn is_empty(&self) -> bool {
        self.cell_formats.is_empty()
    }
}
