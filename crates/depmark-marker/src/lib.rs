//! Clone-preserving write-back: reopen the original workbook bytes as a
//! zip package, swap cell styles on marked rows for fill-derived ones, and
//! repackage with every other part byte-for-byte unchanged. Macro payloads
//! (`xl/vbaProject.bin` and friends) are ordinary entries here and ride
//! through untouched, which is what makes `.xlsm` preservation structural
//! rather than best-effort.
//!
//! There is deliberately no from-scratch rebuild path: if the clone cannot
//! be reopened or re-serialized the whole call fails, because a rebuilt
//! document silently loses macros, charts, and anything else the model
//! does not know about.

mod ooxml;
mod package;
mod sheet_patch;
mod styles;

pub use package::apply_marks;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkError {
    #[error("package does not open as a zip archive: {0}")]
    Package(String),
    #[error("required package part missing: {0}")]
    MissingPart(String),
    #[error("failed to rewrite {part}: {reason}")]
    Xml { part: String, reason: String },
    #[error("failed to serialize output package: {0}")]
    Serialize(String),
}

impl MarkError {
    fn xml(part: &str, reason: impl ToString) -> Self {
        Self::Xml {
            part: part.to_string(),
            reason: reason.to_string(),
        }
    }
}
