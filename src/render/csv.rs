//! CSV rendering of sheet rows.

use super::options::{ConvertOptions, LineTerminator};
use crate::error::{Error, Result};
use crate::xlsx::Row;
use std::borrow::Cow;
use std::io::{self, Write};

/// Serializes rows as delimited text.
#[derive(Debug, Clone)]
pub struct CsvRenderer {
    delimiter: u8,
    terminator: LineTerminator,
    escape_control_chars: bool,
    ignore_empty_lines: bool,
    sheet_separator: String,
}

impl CsvRenderer {
    /// Create a renderer; fails if the delimiter setting is unusable.
    pub fn new(options: &ConvertOptions) -> Result<Self> {
        Ok(Self {
            delimiter: options.delimiter_byte()?,
            terminator: options.line_terminator,
            escape_control_chars: options.escape_control_chars,
            ignore_empty_lines: options.ignore_empty_lines,
            sheet_separator: options.sheet_separator.clone(),
        })
    }

    fn builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .flexible(true)
            .terminator(match self.terminator {
                LineTerminator::Lf => csv::Terminator::Any(b'\n'),
                LineTerminator::Crlf => csv::Terminator::CRLF,
            });
        builder
    }

    /// Render rows into a string.
    pub fn render<I>(&self, rows: I) -> Result<String>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let mut out = Vec::new();
        self.write_rows(&mut out, rows)?;
        String::from_utf8(out).map_err(|e| Error::Csv(e.to_string()))
    }

    /// Write rows to `out`, returning how many lines were written.
    pub fn write_rows<W, I>(&self, out: &mut W, rows: I) -> Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = Result<Row>>,
    {
        let mut writer = self.builder().from_writer(out);
        let mut written = 0;

        for row in rows {
            let row = row?;
            let blank = row.iter().all(|field| field.is_empty());
            if blank && self.ignore_empty_lines {
                continue;
            }

            if blank && row.len() <= 1 {
                // csv writes a lone empty field as `""`; a blank row stays blank.
                let inner = writer.into_inner().map_err(|e| {
                    Error::Io(io::Error::new(e.error().kind(), e.error().to_string()))
                })?;
                inner.write_all(self.terminator.as_str().as_bytes())?;
                writer = self.builder().from_writer(inner);
            } else if self.escape_control_chars {
                let fields: Vec<Cow<'_, str>> =
                    row.iter().map(|field| escape_control_chars(field)).collect();
                writer.write_record(fields.iter().map(|field| field.as_bytes()))?;
            } else {
                writer.write_record(&row)?;
            }
            written += 1;
        }

        writer.flush()?;
        Ok(written)
    }

    /// Write the line that separates two sheets; nothing if it is empty.
    pub fn write_separator<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.sheet_separator.is_empty() {
            return Ok(());
        }
        out.write_all(self.sheet_separator.as_bytes())?;
        out.write_all(self.terminator.as_str().as_bytes())?;
        Ok(())
    }
}

/// Replace CR, LF and TAB with their two-character escapes.
pub fn escape_control_chars(field: &str) -> Cow<'_, str> {
    if !field.contains(['\r', '\n', '\t']) {
        return Cow::Borrowed(field);
    }
    let mut escaped = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        match c {
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
