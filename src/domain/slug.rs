//! Slug derivation
//!
//! The slug is the join key between catalog rows and on-disk artifacts, so it
//! must be a pure function of the entry name.

use once_cell::sync::Lazy;
use regex::Regex;

use super::constants::catalog::SLUG_SEPARATOR;

static NON_ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-z0-9]+").expect("valid slug pattern"));

/// Derive the slug for an entry name.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, and trims separators from both ends. Names with no ASCII
/// alphanumerics produce an empty slug, which the loader rejects.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut sep = [0u8; 4];
    let sep = SLUG_SEPARATOR.encode_utf8(&mut sep);
    NON_ALNUM_RUN
        .replace_all(&lowered, &*sep)
        .trim_matches(SLUG_SEPARATOR)
        .to_string()
}
