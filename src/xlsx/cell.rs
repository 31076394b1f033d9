//! Cell values and their display strings.

use super::datetime::{
    format_datetime, serial_to_datetime, DateSystem, DEFAULT_DATETIME_FORMAT,
    DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT,
};
use super::number_format::{FormatType, NumberFormat};

/// Integral values below this magnitude print without a fractional part.
const INTEGER_LIMIT: f64 = 1e15;

/// Value of a cell as stored in the sheet, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    /// Numeric payload, kept as written so malformed values can be reported.
    Number(String),
    Text(String),
    Bool(bool),
    /// Error literal such as `#DIV/0!`.
    Error(String),
}

/// A parsed cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// 0-based row index
    pub row: u32,
    /// 0-based column index
    pub column: u32,
    pub raw: RawValue,
    pub style_index: usize,
    pub resolved_type: FormatType,
    pub hyperlink: Option<String>,
}

/// Turns raw values into display strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFormatter<'a> {
    pub date_system: DateSystem,
    pub date_format: Option<&'a str>,
    pub time_format: Option<&'a str>,
    pub float_precision: Option<usize>,
}

impl<'a> ValueFormatter<'a> {
    pub fn new(date_system: DateSystem) -> Self {
        Self {
            date_system,
            ..Default::default()
        }
    }

    /// Render a raw value under a number format classified as `format_type`.
    ///
    /// Returns `None` when a numeric payload cannot be parsed.
    pub fn display(
        &self,
        raw: &RawValue,
        format: &NumberFormat,
        format_type: FormatType,
    ) -> Option<String> {
        let text = match raw {
            RawValue::Empty => return Some(String::new()),
            RawValue::Text(s) | RawValue::Error(s) => return Some(s.clone()),
            RawValue::Bool(true) => return Some("TRUE".to_string()),
            RawValue::Bool(false) => return Some("FALSE".to_string()),
            RawValue::Number(text) => text,
        };

        if format_type == FormatType::Text {
            return Some(text.clone());
        }

        let value: f64 = text.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
        let rendered = match format_type {
            FormatType::Percentage => format_percentage(value),
            FormatType::Date => {
                let pattern = self.date_format.unwrap_or(if format.shows_time() {
                    DEFAULT_DATETIME_FORMAT
                } else {
                    DEFAULT_DATE_FORMAT
                });
                self.format_serial(value, pattern)
            }
            FormatType::Time => {
                let pattern = self
                    .time_format
                    .or(self.date_format)
                    .unwrap_or(DEFAULT_TIME_FORMAT);
                self.format_serial(value, pattern)
            }
            FormatType::General | FormatType::Text => self.format_number(value),
        };
        Some(rendered)
    }

    /// Serials outside the calendar fall back to the plain number.
    fn format_serial(&self, serial: f64, pattern: &str) -> String {
        serial_to_datetime(serial, self.date_system)
            .and_then(|value| format_datetime(&value, pattern))
            .unwrap_or_else(|| self.format_number(serial))
    }

    fn format_number(&self, value: f64) -> String {
        if let Some(precision) = self.float_precision {
            return format!("{:.*}", precision, value);
        }
        format_general(value)
    }
}

/// Most compact decimal form: `42`, not `42.0`.
pub fn format_general(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < INTEGER_LIMIT {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// `0.125` renders as `12.5%`; at most two decimals are kept.
pub fn format_percentage(value: f64) -> String {
    let fixed = format!("{:.2}", value * 100.0);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{}%", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(s: &str) -> RawValue {
        RawValue::Number(s.to_string())
    }

    fn general() -> &'static NumberFormat {
        NumberFormat::general()
    }

    #[test]
    fn test_general_numbers() {
        let fmt = ValueFormatter::default();
        let show = |s: &str| fmt.display(&number(s), general(), FormatType::General).unwrap();
        assert_eq!(show("42"), "42");
        assert_eq!(show("42.0"), "42");
        assert_eq!(show("-7"), "-7");
        assert_eq!(show("3.5"), "3.5");
        assert_eq!(show("0.1"), "0.1");
        assert_eq!(show("1E+3"), "1000");
        assert_eq!(show("1e20"), "100000000000000000000");
    }

    #[test]
    fn test_float_precision() {
        let fmt = ValueFormatter {
            float_precision: Some(2),
            ..Default::default()
        };
        assert_eq!(
            fmt.display(&number("3.14159"), general(), FormatType::General).unwrap(),
            "3.14"
        );
        assert_eq!(
            fmt.display(&number("42"), general(), FormatType::General).unwrap(),
            "42.00"
        );
    }

    #[test]
    fn test_percentage() {
        assert_eq!(format_percentage(0.5), "50%");
        assert_eq!(format_percentage(0.125), "12.5%");
        assert_eq!(format_percentage(0.1234), "12.34%");
        assert_eq!(format_percentage(1.0), "100%");
        assert_eq!(format_percentage(-0.00001), "0%");
    }

    #[test]
    fn test_dates_and_times() {
        let fmt = ValueFormatter::new(DateSystem::Epoch1900);
        let date = NumberFormat::from_code("mm-dd-yy");
        let datetime = NumberFormat::from_code("m/d/yy h:mm");
        let time = NumberFormat::from_code("h:mm:ss");

        assert_eq!(
            fmt.display(&number("1"), &date, FormatType::Date).unwrap(),
            "1900-01-01"
        );
        assert_eq!(
            fmt.display(&number("44197.5"), &datetime, FormatType::Date).unwrap(),
            "2021-01-01 12:00:00"
        );
        assert_eq!(
            fmt.display(&number("0.5"), &time, FormatType::Time).unwrap(),
            "12:00:00"
        );

        let fmt = ValueFormatter::new(DateSystem::Epoch1904);
        assert_eq!(
            fmt.display(&number("0"), &date, FormatType::Date).unwrap(),
            "1904-01-01"
        );
    }

    #[test]
    fn test_format_overrides() {
        let fmt = ValueFormatter {
            date_format: Some("%d/%m/%Y"),
            time_format: Some("%H.%M"),
            ..ValueFormatter::new(DateSystem::Epoch1900)
        };
        let date = NumberFormat::from_code("mm-dd-yy");
        let time = NumberFormat::from_code("h:mm");
        assert_eq!(
            fmt.display(&number("44197"), &date, FormatType::Date).unwrap(),
            "01/01/2021"
        );
        assert_eq!(
            fmt.display(&number("0.75"), &time, FormatType::Time).unwrap(),
            "18.00"
        );
    }

    #[test]
    fn test_out_of_range_serial_falls_back_to_number() {
        let fmt = ValueFormatter::default();
        let date = NumberFormat::from_code("mm-dd-yy");
        assert_eq!(
            fmt.display(&number("99999999"), &date, FormatType::Date).unwrap(),
            "99999999"
        );
    }

    #[test]
    fn test_non_numeric_values() {
        let fmt = ValueFormatter::default();
        let text = NumberFormat::from_code("@");
        assert_eq!(
            fmt.display(&number("00123"), &text, FormatType::Text).unwrap(),
            "00123"
        );
        assert_eq!(
            fmt.display(&RawValue::Bool(true), general(), FormatType::General).unwrap(),
            "TRUE"
        );
        assert_eq!(
            fmt.display(&RawValue::Error("#N/A".into()), general(), FormatType::General)
                .unwrap(),
            "#N/A"
        );
        assert_eq!(
            fmt.display(&RawValue::Empty, general(), FormatType::Date).unwrap(),
            ""
        );
    }

    #[test]
    fn test_malformed_number() {
        let fmt = ValueFormatter::default();
        assert!(fmt.display(&number("12abc"), general(), FormatType::General).is_none());
        assert!(fmt.display(&number("NaN"), general(), FormatType::General).is_none());
    }
}
