//! Canonical comparison form for dish names and queries.
//!
//! Accent-insensitive equality is the backbone of the engine: stored
//! normalized names, search containment checks, and ingestion matching all
//! go through [`normalize`]. Anything that compares names another way is
//! a bug.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Decompose (NFD), strip combining marks, lower-case, trim.
///
/// Total and idempotent: `normalize(normalize(s)) == normalize(s)`.
/// "Bacalhau à Brás" and "bacalhau a bras" collapse to the same form.
pub fn normalize(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}
