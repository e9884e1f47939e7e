//! Normalized edit-distance similarity between two strings

use strsim::levenshtein;

/// Longest prefix, in chars, that takes part in a comparison.
pub const MAX_COMPARE_CHARS: usize = 256;

/// Similarity in `[0, 1]` derived from the Levenshtein distance.
///
/// Returns `0.0` when exactly one side is empty and `1.0` when both are.
/// Case is not folded here; callers normalize before comparing. Inputs are
/// cut to `MAX_COMPARE_CHARS` so request-sized strings stay cheap.
pub fn similarity(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() != s2.is_empty() {
        return 0.0;
    }

    let s1 = truncate_chars(s1, MAX_COMPARE_CHARS);
    let s2 = truncate_chars(s2, MAX_COMPARE_CHARS);

    let (longer, shorter) = if s1.chars().count() >= s2.chars().count() {
        (s1, s2)
    } else {
        (s2, s1)
    };

    let longer_len = longer.chars().count();
    if longer_len == 0 {
        return 1.0;
    }

    let distance = levenshtein(longer, shorter);
    (longer_len - distance) as f64 / longer_len as f64
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
