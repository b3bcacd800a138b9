//! Tabular file reader for attendance sheets and rosters.
//!
//! CSV files go through the `csv` crate, spreadsheet workbooks through
//! `calamine` (first worksheet only). Both end up as rows of [`Cell`].

use calamine::{Data, Reader, open_workbook_auto};
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::SheetError;

pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// A single loosely-typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Coerces the cell to an integer.
    ///
    /// Spreadsheets store every number as a float, so integral floats are
    /// accepted. Text is trimmed and parsed the same way.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Empty => None,
            Cell::Int(i) => Some(*i),
            Cell::Float(f) => integral(*f),
            Cell::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
    }

    /// Renders the cell as display text. Empty cells become an empty string.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
        }
    }

    fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::String(s) => Cell::from_text(s),
            Data::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::from_text(&other.to_string()),
        }
    }
}

/// Rows read from one file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns the cell at `(row, col)`, treating ragged rows as padded with
    /// empty cells.
    pub fn cell(row: &[Cell], col: usize) -> &Cell {
        row.get(col).unwrap_or(&Cell::Empty)
    }

    /// Fails unless the table is empty or at least `columns` wide.
    pub fn require_columns(&self, columns: usize) -> Result<(), SheetError> {
        let found = self.width();
        if self.rows.is_empty() || found >= columns {
            Ok(())
        } else {
            Err(SheetError::Shape {
                expected: columns,
                found,
            })
        }
    }
}

/// Reads the file at `path` into a [`Table`], dropping the first row when
/// `has_headers` is set.
///
/// # Errors
///
/// Returns an error if the extension is not a supported tabular format or the
/// file cannot be opened or decoded.
pub fn read_table(path: &Path, has_headers: bool) -> Result<Table, SheetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut table = if extension == "csv" {
        read_csv(path)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook(path)?
    } else {
        return Err(SheetError::UnsupportedFormat(extension));
    };

    if has_headers && !table.rows.is_empty() {
        table.rows.remove(0);
    }

    debug!(
        file = %path.display(),
        rows = table.rows.len(),
        width = table.width(),
        "Table read"
    );
    Ok(table)
}

fn read_csv(path: &Path) -> Result<Table, SheetError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(Table { rows })
}

fn read_workbook(path: &Path) -> Result<Table, SheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoWorksheet)??;

    let rows = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Table { rows })
}
