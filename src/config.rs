use depmark_detect::{ColumnStrategy, GroupingRule};
use serde::{Deserialize, Serialize};

/// Static marking policy: read-only after construction, shared freely
/// across calls. `Default` is the production policy; every field can be
/// overridden from a serialized config (the CLI accepts a JSON file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkConfig {
    /// Accepted filename extensions, lowercase, without the dot. Legacy
    /// binary `.xls` is deliberately absent: a BIFF stream cannot be
    /// clone-patched.
    pub allowed_extensions: Vec<String>,
    /// Token a status cell must equal (after trim + case fold) for its row
    /// to count as a status row.
    pub marker_token: String,
    /// RGB hex of the marking fill.
    pub fill_rgb: String,
    /// Inserted between the original stem and extension of the output
    /// filename, joined with an underscore.
    pub output_suffix: String,
    /// Candidate header-row offsets, most likely first.
    pub header_offsets: Vec<usize>,
    pub columns: ColumnStrategy,
    pub grouping: GroupingRule,
}

impl Default for MarkConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["xlsx".to_string(), "xlsm".to_string()],
            marker_token: "DEP".to_string(),
            fill_rgb: "FFFF00".to_string(),
            output_suffix: "WEBPT.processed".to_string(),
            header_offsets: vec![0, 1, 2, 3],
            columns: ColumnStrategy::default(),
            grouping: GroupingRule::default(),
        }
    }
}

impl MarkConfig {
    /// `extension` with or without its leading dot, any case.
    pub fn allows_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }
}
