use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// How many header names a resolution failure carries for diagnostics.
pub const HEADER_DIAGNOSTIC_LIMIT: usize = 8;

/// One priority-ordered header match rule: a tag naming the rule and a
/// lowercase needle matched by containment against the normalized header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub tag: String,
    pub needle: String,
}

impl HeaderRule {
    pub fn new(tag: &str, needle: &str) -> Self {
        Self {
            tag: tag.to_string(),
            needle: needle.to_ascii_lowercase(),
        }
    }

    fn matches(&self, header_lower: &str) -> bool {
        !self.needle.is_empty() && header_lower.contains(&self.needle)
    }
}

/// Priority-ordered rule tables for the two roles. Input files vary column
/// naming across jurisdictions, so resolution is name-driven; the order
/// within each list is the match priority (most specific phrase first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRules {
    pub key: Vec<HeaderRule>,
    pub status: Vec<HeaderRule>,
}

impl Default for RoleRules {
    fn default() -> Self {
        Self {
            key: vec![
                HeaderRule::new("parcel-number", "parcel number"),
                HeaderRule::new("parcel-no", "parcel no"),
                HeaderRule::new("parcel-id", "parcel id"),
                HeaderRule::new("parcel", "parcel"),
            ],
            status: vec![HeaderRule::new("dep", "dep")],
        }
    }
}

/// Column resolution policy: heuristic name matching (production default)
/// or fixed positions for callers that know their layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStrategy {
    Heuristic(RoleRules),
    FixedPosition { key: usize, status: usize },
}

impl Default for ColumnStrategy {
    fn default() -> Self {
        Self::Heuristic(RoleRules::default())
    }
}

/// Resolved 0-based column indices plus the tag of the rule that matched
/// each role (for logging; "fixed" under `FixedPosition`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub key: usize,
    pub status: usize,
    pub key_rule: String,
    pub status_rule: String,
}

/// Resolution failure, carrying the first few observed header names so the
/// caller's error message can show what was actually in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFailure {
    pub headers: Vec<String>,
}

/// Scan header cells in column order and fill each role with the first
/// column whose name matches that role's rules. A column fills at most one
/// role, key checked before status, and scanning stops once both roles are
/// filled, which keeps the choice deterministic when several headers
/// could match.
pub fn resolve_columns(
    header: &[String],
    strategy: &ColumnStrategy,
) -> Result<ResolvedColumns, ResolveFailure> {
    match strategy {
        ColumnStrategy::FixedPosition { key, status } => {
            if *key != *status && *key < header.len() && *status < header.len() {
                Ok(ResolvedColumns {
                    key: *key,
                    status: *status,
                    key_rule: "fixed".to_string(),
                    status_rule: "fixed".to_string(),
                })
            } else {
                Err(failure(header))
            }
        }
        ColumnStrategy::Heuristic(rules) => {
            let mut key: Option<(usize, &HeaderRule)> = None;
            let mut status: Option<(usize, &HeaderRule)> = None;
            for (idx, name) in header.iter().enumerate() {
                let lower = normalize(name).to_ascii_lowercase();
                if lower.is_empty() {
                    continue;
                }
                if key.is_none() {
                    if let Some(rule) = rules.key.iter().find(|r| r.matches(&lower)) {
                        key = Some((idx, rule));
                        continue; // one column never fills both roles
                    }
                }
                if status.is_none() {
                    if let Some(rule) = rules.status.iter().find(|r| r.matches(&lower)) {
                        status = Some((idx, rule));
                    }
                }
                if key.is_some() && status.is_some() {
                    break;
                }
            }
            match (key, status) {
                (Some((k, kr)), Some((s, sr))) => Ok(ResolvedColumns {
                    key: k,
                    status: s,
                    key_rule: kr.tag.clone(),
                    status_rule: sr.tag.clone(),
                }),
                _ => Err(failure(header)),
            }
        }
    }
}

fn failure(header: &[String]) -> ResolveFailure {
    ResolveFailure {
        headers: header
            .iter()
            .take(HEADER_DIAGNOSTIC_LIMIT)
            .map(|h| normalize(h).to_string())
            .collect(),
    }
}
