//! Tabular view extraction: open workbook bytes, materialize the first
//! sheet as an absolute-coordinate string grid, and probe candidate
//! header-row offsets until column resolution succeeds.

mod grid;
mod probe;

pub use grid::{cell_text, SheetError, SheetGrid};
pub use probe::{probe, ProbeFailure, ProbedView};
