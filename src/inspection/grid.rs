use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Failed to read CSV content: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Workbook has no worksheets")]
    NoWorksheet,
}

/// Source format of an inspection report, chosen from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Text,
    Workbook,
}

impl GridFormat {
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => GridFormat::Workbook,
            _ => GridFormat::Text,
        }
    }
}

/// Header-less table of optional text cells, addressed by (row, column)
///
/// Rows may have different lengths. Any read outside the loaded cells is
/// treated as a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Option<String>>>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Convenience constructor where empty strings stand for missing cells
    pub fn from_str_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| to_cell(cell.as_ref())).collect())
            .collect();
        Self { rows }
    }

    /// Load a grid from raw file bytes, picking the parser from the file name
    pub fn from_bytes(filename: &str, bytes: &[u8]) -> Result<Self, GridError> {
        match GridFormat::from_filename(filename) {
            GridFormat::Text => Self::from_csv_text(&decode_lossy(bytes)),
            GridFormat::Workbook => Self::from_workbook_bytes(bytes),
        }
    }

    /// Parse header-less, possibly ragged CSV text
    pub fn from_csv_text(content: &str) -> Result<Self, GridError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(to_cell).collect());
        }

        debug!("Loaded CSV grid with {} rows", rows.len());
        Ok(Self { rows })
    }

    /// Read the first worksheet of a workbook (xlsx, xls, ods, ...)
    ///
    /// Cell positions are kept absolute: a sheet whose used range starts at
    /// C3 still has its first value at (2, 2).
    pub fn from_workbook_bytes(bytes: &[u8]) -> Result<Self, GridError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| GridError::WorkbookOpen(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(GridError::NoWorksheet)?
            .map_err(|e| GridError::WorkbookOpen(e.to_string()))?;

        let grid = Self::from_range(&range);
        debug!("Loaded workbook grid with {} rows", grid.row_count());
        Ok(grid)
    }

    fn from_range(range: &Range<Data>) -> Self {
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); start_row];
        for sheet_row in range.rows() {
            let mut row = vec![None; start_col];
            row.extend(sheet_row.iter().map(data_to_cell));
            rows.push(row);
        }
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cells of one row; an out-of-range row is empty
    pub fn row(&self, row: usize) -> &[Option<String>] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Raw cell text, `None` when missing or out of range
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.row(row).get(col).and_then(|cell| cell.as_deref())
    }

    /// Trimmed cell value, treating blanks and the textual markers
    /// `nan` / `none` (any case) as absent
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        let trimmed = self.cell(row, col)?.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("none")
        {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Decode report bytes as UTF-8, dropping undecodable bytes and a leading BOM
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    text
}

fn to_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn data_to_cell(data: &Data) -> Option<String> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => to_cell(s),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|value| value.to_string())
            .or_else(|| Some(dt.as_f64().to_string())),
        other => Some(other.to_string()),
    }
}
