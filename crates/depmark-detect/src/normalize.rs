/// Trim surrounding whitespace. Keys compare on this form: trimmed but
/// case-preserving, since parcel identifiers can be alphanumeric with
/// meaningful case.
pub fn normalize(value: &str) -> &str {
    value.trim()
}

/// Trim and ASCII-uppercase, for token comparisons like the "DEP" status
/// marker where input files vary in casing.
pub fn normalize_upper(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}
