use std::io::Cursor;

use calamine_styles::{Data, Reader, Xlsx};
use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("workbook does not parse as an xlsx package: {0}")]
    Unreadable(String),
    #[error("workbook contains no sheets")]
    NoSheets,
}

/// The first sheet of a workbook as a dense string grid in absolute sheet
/// coordinates: `row(0)` is sheet row 1 even when the used range starts
/// lower, so a grid row index always maps to sheet row `index + 1`. That
/// keeps the write-back row numbers exact by construction instead of by
/// offset arithmetic against the used-range anchor.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    /// Decode workbook bytes and materialize the first sheet in workbook
    /// order. Cell values go through [`cell_text`]; formulas contribute
    /// their cached values, which is all run detection needs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SheetError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;
        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(SheetError::NoSheets)?;
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SheetError::Unreadable(format!("sheet '{name}': {e}")))?;

        let mut rows = Vec::new();
        if let Some((end_row, end_col)) = range.end() {
            let height = end_row as usize + 1;
            let width = end_col as usize + 1;
            rows.reserve(height);
            for r in 0..height {
                let mut row = Vec::with_capacity(width);
                for c in 0..width {
                    let text = range
                        .get_value((r as u32, c as u32))
                        .map(cell_text)
                        .unwrap_or_default();
                    row.push(text);
                }
                rows.push(row);
            }
        }
        tracing::debug!(sheet = %name, rows = rows.len(), "decoded first sheet");
        Ok(Self { name, rows })
    }

    /// Build a grid from already-materialized rows. Used by probing tests
    /// and callers that source tabular data elsewhere.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Values of one column for every row from `from_row` down, empty
    /// string where a row is shorter than the column index.
    pub fn column_values(&self, col: usize, from_row: usize) -> Vec<String> {
        self.rows
            .iter()
            .skip(from_row)
            .map(|row| row.get(col).cloned().unwrap_or_default())
            .collect()
    }
}

/// Raw cell value to comparable string form. Missing and error cells become
/// empty, as do NaN floats; integral floats render without a trailing `.0`;
/// date cells render ISO-8601 (date-only at midnight). Every value
/// stringifies to something, possibly empty.
pub fn cell_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.is_nan() {
                String::new()
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => {
                if ndt.time() == NaiveTime::MIN {
                    ndt.date().format("%Y-%m-%d").to_string()
                } else {
                    ndt.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            }
            None => format!("{}", dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::RichText(rt) => rt.plain_text(),
        Data::Error(_) => String::new(),
    }
}
