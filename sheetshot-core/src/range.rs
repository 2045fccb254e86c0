//! A1-style cell range parsing and resolution

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Last column of a worksheet (XFD), 0-based
pub const MAX_COLUMN: u32 = 16_383;
/// Last row of a worksheet, 0-based
pub const MAX_ROW: u32 = 1_048_575;

static CELL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range is empty")]
    Empty,
    #[error("malformed cell reference '{0}'")]
    BadReference(String),
    #[error("column '{0}' is beyond XFD")]
    ColumnOutOfBounds(String),
    #[error("row {0} is outside 1..=1048576")]
    RowOutOfBounds(u64),
    #[error("sheet name is missing its closing quote")]
    UnterminatedQuote,
    #[error("sheet qualifier is empty")]
    EmptySheetName,
    #[error("multi-area references are not supported")]
    MultipleAreas,
}

/// Inclusive rectangular cell region with 0-based (row, col) corners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: Option<String>,
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl CellRange {
    /// Build a range from two corners in any order
    pub fn new(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            sheet: None,
            start: (a.0.min(b.0), a.1.min(b.1)),
            end: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Parse `A1`, `B2:C15`, `$A$1:$B$2` or a sheet-qualified form such as
    /// `Sheet2!B2:C15` and `'My Sheet'!A1`.
    pub fn parse(text: &str) -> Result<Self, RangeError> {
        let text = text.trim();
        let text = text.strip_prefix('=').unwrap_or(text).trim();
        if text.is_empty() {
            return Err(RangeError::Empty);
        }
        if text.contains(',') {
            return Err(RangeError::MultipleAreas);
        }

        let (sheet, cells) = split_sheet(text)?;
        let mut corners = cells.split(':');
        let first = corners.next().unwrap_or_default();
        let second = corners.next();
        if corners.next().is_some() {
            return Err(RangeError::BadReference(cells.to_string()));
        }

        let start = parse_cell_ref(first)?;
        let end = match second {
            Some(second) => parse_cell_ref(second)?,
            None => start,
        };

        let mut range = CellRange::new(start, end);
        range.sheet = sheet;
        Ok(range)
    }

    pub fn rows(&self) -> u32 {
        self.end.0 - self.start.0 + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.1 - self.start.1 + 1
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start.0 && row <= self.end.0 && col >= self.start.1 && col <= self.end.1
    }

    /// Overlap of two ranges, ignoring sheet qualifiers
    pub fn intersect(&self, other: &CellRange) -> Option<CellRange> {
        let start = (
            self.start.0.max(other.start.0),
            self.start.1.max(other.start.1),
        );
        let end = (self.end.0.min(other.end.0), self.end.1.min(other.end.1));
        if start.0 > end.0 || start.1 > end.1 {
            return None;
        }
        Some(CellRange {
            sheet: self.sheet.clone(),
            start,
            end,
        })
    }

    /// Unqualified A1 form, e.g. `B2:C15`
    pub fn to_a1(&self) -> String {
        let start = cell_name(self.start.0, self.start.1);
        if self.start == self.end {
            start
        } else {
            format!("{}:{}", start, cell_name(self.end.0, self.end.1))
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) if needs_quotes(sheet) => {
                write!(f, "'{}'!{}", sheet.replace('\'', "''"), self.to_a1())
            }
            Some(sheet) => write!(f, "{}!{}", sheet, self.to_a1()),
            None => write!(f, "{}", self.to_a1()),
        }
    }
}

/// Resolve range text against the workbook's defined names, falling back to
/// a literal reference.
pub fn resolve_range(
    text: &str,
    defined_names: &[(String, String)],
) -> Result<CellRange, RangeError> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim();

    if let Some((_, reference)) = defined_names
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
    {
        return CellRange::parse(reference);
    }

    CellRange::parse(trimmed)
}

/// Parse a single cell reference like `B7` or `$B$7` into 0-based (row, col)
pub fn parse_cell_ref(cell_ref: &str) -> Result<(u32, u32), RangeError> {
    let caps = CELL_REF
        .captures(cell_ref.trim())
        .ok_or_else(|| RangeError::BadReference(cell_ref.to_string()))?;

    let letters = &caps[1];
    let col = column_index(letters)
        .filter(|col| *col <= MAX_COLUMN)
        .ok_or_else(|| RangeError::ColumnOutOfBounds(letters.to_ascii_uppercase()))?;

    let row: u64 = caps[2]
        .parse()
        .map_err(|_| RangeError::BadReference(cell_ref.to_string()))?;
    if row == 0 || row > u64::from(MAX_ROW) + 1 {
        return Err(RangeError::RowOutOfBounds(row));
    }

    Ok(((row - 1) as u32, col))
}

/// Convert column letters to a 0-based index (A -> 0, AA -> 26)
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut col = 0u32;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    Some(col - 1)
}

/// Convert a 0-based column index to letters (0 -> A, 26 -> AA)
pub fn column_name(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// Excel-style name of a 0-based cell position (e.g. (0, 0) -> "A1")
pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// Split `Sheet!A1:B2` into its sheet qualifier and cell part.
///
/// Cell references never contain `!`, so the last one always separates the
/// qualifier even when a quoted sheet name has its own.
fn split_sheet(text: &str) -> Result<(Option<String>, &str), RangeError> {
    let Some(idx) = text.rfind('!') else {
        return Ok((None, text));
    };
    let (qualifier, cells) = (&text[..idx], &text[idx + 1..]);

    let sheet = match qualifier.strip_prefix('\'') {
        Some(inner) => inner
            .strip_suffix('\'')
            .ok_or(RangeError::UnterminatedQuote)?
            .replace("''", "'"),
        None => qualifier.to_string(),
    };

    if sheet.is_empty() {
        return Err(RangeError::EmptySheetName);
    }
    Ok((Some(sheet), cells))
}

fn needs_quotes(sheet: &str) -> bool {
    !sheet.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}
