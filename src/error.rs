use thiserror::Error;

/// One failure per call, tagged with the pipeline stage that produced it.
/// Nothing here is retried: malformed input does not become valid on a
/// second attempt, and no partial output is ever returned.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("unsupported file type '{extension}': allowed extensions are .xlsx and .xlsm")]
    UnsupportedFormat { extension: String },

    #[error("input is empty or too small to be a workbook ({len} bytes)")]
    EmptyOrUndersizedInput { len: usize },

    #[error("workbook does not parse: {reason}")]
    UnreadableDocument { reason: String },

    #[error("required columns not found; headers seen: [{}]", .headers.join(", "))]
    ColumnsNotFound { headers: Vec<String> },

    #[error("sheet has a header row but no data rows")]
    NoDataRows,

    #[error("clone-preserving write-back failed: {reason}")]
    CloneFailed { reason: String },
}

impl ProcessError {
    /// Pipeline stage the failure belongs to, for logs and telemetry.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } | Self::EmptyOrUndersizedInput { .. } => "validate",
            Self::UnreadableDocument { .. } => "decode",
            Self::ColumnsNotFound { .. } => "resolve",
            Self::NoDataRows => "detect",
            Self::CloneFailed { .. } => "write",
        }
    }
}
