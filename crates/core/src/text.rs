//! Text normalization shared by every matcher.
//!
//! Matching is done on a folded form of the input: lowercase, accents stripped
//! (`á` → `a`, `ñ` → `n`) and whitespace collapsed. Everything else is left as is.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

pub fn normalize(text: &str) -> String {
    let folded = text.nfd().filter(|ch| !is_combining_mark(*ch)).collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the already-normalized text contains any of the needles.
///
/// Needles are expected in normalized form as well.
pub fn contains_any(normalized: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| normalized.contains(needle))
}
