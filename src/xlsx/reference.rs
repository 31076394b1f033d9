//! A1-style cell references.

use std::fmt;

/// Largest column index a worksheet can address (XFD).
pub const MAX_COLUMN: u32 = 16_383;

/// Largest 0-based row index a worksheet can address (row 1048576).
pub const MAX_ROW: u32 = 1_048_575;

/// Parse a column name (`A`, `Z`, `AA`) into a 0-based index.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let index = index - 1;
    (index <= MAX_COLUMN).then_some(index)
}

/// Render a 0-based column index as letters.
pub fn column_name(mut index: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Parse `B3` (or `$B$3`) into 0-based `(row, column)`.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim();
    let split = reference
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)?;
    let (letters, digits) = reference.split_at(split);
    let column = column_index(letters.trim_matches('$'))?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row - 1 > MAX_ROW {
        return None;
    }
    Some((row - 1, column))
}

/// Rectangular block of cells, inclusive on both ends, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub top_row: u32,
    pub left_col: u32,
    pub bottom_row: u32,
    pub right_col: u32,
}

impl CellRange {
    /// Parse `A1:C4`; a single reference yields a one-cell range.
    pub fn parse(reference: &str) -> Option<Self> {
        let (start, end) = match reference.split_once(':') {
            Some((start, end)) => (parse_cell_ref(start)?, parse_cell_ref(end)?),
            None => {
                let cell = parse_cell_ref(reference)?;
                (cell, cell)
            }
        };
        Some(Self {
            top_row: start.0.min(end.0),
            left_col: start.1.min(end.1),
            bottom_row: start.0.max(end.0),
            right_col: start.1.max(end.1),
        })
    }

    /// Top-left cell of the range.
    pub fn anchor(&self) -> (u32, u32) {
        (self.top_row, self.left_col)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.top_row..=self.bottom_row).contains(&row)
            && (self.left_col..=self.right_col).contains(&col)
    }

    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        (row, col) == self.anchor()
    }

    pub fn is_single_cell(&self) -> bool {
        self.top_row == self.bottom_row && self.left_col == self.right_col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_name(self.left_col),
            self.top_row + 1,
            column_name(self.right_col),
            self.bottom_row + 1
        )
    }
}
