use depmark_detect::{resolve_columns, ColumnStrategy, ResolvedColumns, HEADER_DIAGNOSTIC_LIMIT};

use crate::grid::SheetGrid;

/// A sheet view committed to one header offset: grid row `header_offset`
/// is the header, everything below it is data.
#[derive(Debug, Clone)]
pub struct ProbedView {
    pub header_offset: usize,
    pub columns: ResolvedColumns,
}

/// Every candidate offset failed; `headers` is what the first candidate's
/// header row looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub headers: Vec<String>,
}

/// Try each candidate header offset in order and commit to the first one
/// where column resolution succeeds. Some input files carry title or
/// report-header rows above the real column header; the bounded ordered
/// candidate list keeps the choice deterministic (first success, not best
/// success) without asking callers to know their file's layout.
pub fn probe(
    grid: &SheetGrid,
    offsets: &[usize],
    strategy: &ColumnStrategy,
) -> Result<ProbedView, ProbeFailure> {
    let mut first_failure: Option<ProbeFailure> = None;
    for &offset in offsets {
        let Some(header) = grid.row(offset) else {
            continue;
        };
        match resolve_columns(header, strategy) {
            Ok(columns) => {
                tracing::debug!(
                    sheet = grid.name(),
                    offset,
                    key = columns.key,
                    key_rule = %columns.key_rule,
                    status = columns.status,
                    status_rule = %columns.status_rule,
                    "header offset accepted"
                );
                return Ok(ProbedView {
                    header_offset: offset,
                    columns,
                });
            }
            Err(failure) => {
                if first_failure.is_none() {
                    first_failure = Some(ProbeFailure {
                        headers: failure.headers,
                    });
                }
            }
        }
    }
    Err(first_failure.unwrap_or_else(|| ProbeFailure {
        headers: grid
            .row(0)
            .map(|row| {
                row.iter()
                    .take(HEADER_DIAGNOSTIC_LIMIT)
                    .map(|h| h.trim().to_string())
                    .collect()
            })
            .unwrap_or_default(),
    }))
}
