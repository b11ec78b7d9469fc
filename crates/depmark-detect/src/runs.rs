use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, normalize_upper};

/// Grouping strategy deciding which status rows qualify for marking.
/// Selected once at configuration time; the detector never branches on
/// anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingRule {
    /// Adjacent equal-key status pairs (the earliest revision of the rule).
    /// Marks the same row set as `ConsecutiveRun`, kept as an explicit
    /// variant so the active policy is visible in configuration.
    ConsecutivePair,
    /// Maximal contiguous equal-key status sequences of length >= 2.
    #[default]
    ConsecutiveRun,
    /// A status row qualifies when its key has >= 2 status rows anywhere
    /// in the file, adjacency ignored.
    GlobalCooccurrence,
}

/// A maximal contiguous sequence of qualifying data rows sharing one key.
/// `start` is a 0-based data-row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub len: usize,
}

impl Run {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Walk the key/status columns and return the qualifying runs, ordered by
/// first row and pairwise disjoint. An empty input yields no runs; that is
/// not an error here (the caller decides whether zero data rows is one).
///
/// A row is a status row iff its status value, trimmed and upper-cased,
/// equals the marker token. Keys compare trimmed but case-sensitive, and
/// an empty key never matches another empty key.
pub fn detect_runs(
    keys: &[String],
    statuses: &[String],
    marker: &str,
    rule: GroupingRule,
) -> Vec<Run> {
    let n = keys.len().min(statuses.len());
    let marker = normalize_upper(marker);
    let status: Vec<bool> = statuses[..n]
        .iter()
        .map(|s| normalize_upper(s) == marker)
        .collect();

    match rule {
        GroupingRule::ConsecutiveRun => consecutive_runs(keys, &status, 2),
        GroupingRule::ConsecutivePair => {
            // Pairwise statement of the same rule: any adjacent equal-key
            // status pair marks both rows. Contiguous marked rows with one
            // key always regroup into the maximal runs.
            consecutive_runs(keys, &status, 2)
        }
        GroupingRule::GlobalCooccurrence => {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for i in 0..status.len() {
                if status[i] {
                    let key = normalize(&keys[i]);
                    if !key.is_empty() {
                        *counts.entry(key).or_insert(0) += 1;
                    }
                }
            }
            consecutive_runs(keys, &status, 1)
                .into_iter()
                .filter(|run| {
                    let key = normalize(&keys[run.start]);
                    counts.get(key).copied().unwrap_or(0) >= 2
                })
                .collect()
        }
    }
}

/// Maximal contiguous equal-key status sequences of at least `min_len`.
fn consecutive_runs(keys: &[String], status: &[bool], min_len: usize) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < status.len() {
        if !status[i] {
            i += 1;
            continue;
        }
        let key = normalize(&keys[i]);
        if key.is_empty() {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < status.len() && status[j] && normalize(&keys[j]) == key {
            j += 1;
        }
        if j - i >= min_len {
            runs.push(Run { start: i, len: j - i });
        }
        i = j;
    }
    runs
}

/// Union of all run rows: the 0-based data-row indices to mark.
pub fn marked_rows(runs: &[Run]) -> BTreeSet<usize> {
    runs.iter().flat_map(Run::rows).collect()
}
