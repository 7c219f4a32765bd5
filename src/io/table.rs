//! In-memory tabular snapshot of one uploaded file.

use serde::Serialize;

/// A single spreadsheet cell value.
///
/// `Empty` stands for any missing value (blank cell, null, spreadsheet error).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Largest magnitude at which a float still maps exactly onto an `i64`.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl Cell {
    /// Build a text cell, mapping the empty string to `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// Check whether the cell holds no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Render the cell as text.
    ///
    /// Integral floats drop their fractional part so that numeric identifiers
    /// read from spreadsheets (where every number is a float) compare equal to
    /// their integer spelling.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => match integral_float(*f) {
                Some(i) => i.to_string(),
                None => f.to_string(),
            },
            Cell::Text(s) => s.clone(),
        }
    }

    /// Interpret the cell as an integer, truncating floats toward zero.
    ///
    /// Returns `None` for empty cells and for text that is not a number.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Empty => None,
            Cell::Bool(b) => Some(i64::from(*b)),
            Cell::Int(i) => Some(*i),
            Cell::Float(f) => truncate_float(*f),
            Cell::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_float))
            }
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Exact integer value of a float, if it has no fractional part.
pub(crate) fn integral_float(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT {
        Some(value as i64)
    } else {
        None
    }
}

fn truncate_float(value: f64) -> Option<i64> {
    if value.is_finite() && value.abs() < MAX_EXACT_FLOAT {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

/// Header row plus data rows, exactly as read from the upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Create a table from a header row and data rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Position of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Check whether a column with this exact name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (row, column); short rows read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
