//! depmark: mark duplicate-run "DEP" rows in xlsx/xlsm workbooks without
//! touching anything else in the package.
//!
//! A caller hands over workbook bytes and a filename and gets back a
//! near-identical package in which every qualifying row (consecutive rows
//! sharing a parcel key, each carrying the "DEP" status marker) has the
//! marking fill applied. Formulas, macros, charts, other sheets, and all
//! workbook metadata come back byte-for-byte unchanged; only the first
//! worksheet part and styles.xml differ, and only in the marked rows'
//! style references.
//!
//! The pipeline runs strictly forward (decode, probe the header offset,
//! resolve columns, detect runs, patch the clone) and holds no state
//! between calls. Transport concerns (HTTP, size limits, timeouts) belong
//! to the caller.

mod config;
mod error;

pub use config::MarkConfig;
pub use error::ProcessError;

pub use depmark_detect::{
    ColumnStrategy, GroupingRule, HeaderRule, ResolvedColumns, RoleRules, Run,
};

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

use depmark_detect::{detect_runs, marked_rows};
use depmark_marker::apply_marks;
use depmark_sheet::{probe, SheetGrid};

/// An empty zip archive is 22 bytes (a bare end-of-central-directory
/// record); anything smaller cannot be a workbook package.
const MIN_PACKAGE_BYTES: usize = 22;

/// Result of one processing call.
#[derive(Debug, Clone)]
pub struct Processed {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Distinct data rows that received the marking fill.
    pub marked_rows: usize,
    /// Data rows below the chosen header row.
    pub total_rows: usize,
}

/// Run the whole pipeline over one document. Any stage failure maps to a
/// typed [`ProcessError`]; no partial output is ever produced.
pub fn process(
    bytes: &[u8],
    filename: &str,
    config: &MarkConfig,
) -> Result<Processed, ProcessError> {
    let (stem, extension) = split_filename(filename);
    if !config.allows_extension(&extension) {
        return Err(ProcessError::UnsupportedFormat { extension });
    }
    if bytes.len() < MIN_PACKAGE_BYTES {
        return Err(ProcessError::EmptyOrUndersizedInput { len: bytes.len() });
    }

    let grid = SheetGrid::from_bytes(bytes).map_err(|e| ProcessError::UnreadableDocument {
        reason: e.to_string(),
    })?;
    let view = probe(&grid, &config.header_offsets, &config.columns)
        .map_err(|e| ProcessError::ColumnsNotFound { headers: e.headers })?;

    let data_start = view.header_offset + 1;
    let total_rows = grid.height().saturating_sub(data_start);
    if total_rows == 0 {
        return Err(ProcessError::NoDataRows);
    }

    let keys = grid.column_values(view.columns.key, data_start);
    let statuses = grid.column_values(view.columns.status, data_start);
    let runs = detect_runs(&keys, &statuses, &config.marker_token, config.grouping);
    let marked = marked_rows(&runs);

    // Grid rows are absolute sheet coordinates, so data row i sits on
    // 1-based sheet row `header_offset + 2 + i` exactly.
    let sheet_rows: BTreeSet<u32> = marked
        .iter()
        .map(|&i| (view.header_offset + 2 + i) as u32)
        .collect();

    let out = apply_marks(bytes, &sheet_rows, &config.fill_rgb).map_err(|e| {
        ProcessError::CloneFailed {
            reason: e.to_string(),
        }
    })?;

    tracing::info!(
        sheet = grid.name(),
        header_offset = view.header_offset,
        runs = runs.len(),
        marked = marked.len(),
        total = total_rows,
        "workbook processed"
    );

    Ok(Processed {
        bytes: out,
        filename: format!("{stem}_{}{extension}", config.output_suffix),
        marked_rows: marked.len(),
        total_rows,
    })
}

/// Filename stem and extension (with its dot, original case preserved).
fn split_filename(filename: &str) -> (String, String) {
    let path = Path::new(filename);
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(filename)
        .to_string();
    (stem, extension)
}
