// src/fuzzy.rs
//! String similarity primitives, all symmetric and in [0,1].
//!
//! `token_set_ratio` follows the usual token-set construction: whitespace tokens are
//! deduplicated into sets, the shared tokens form the "intersection" string, and the
//! score is the best Indel ratio among `sect` vs `sect+diff_a`, `sect` vs `sect+diff_b`
//! and `sect+diff_a` vs `sect+diff_b`. If one token set contains the other, the score is 1.

use rapidfuzz::distance::indel;
use rapidfuzz::fuzz;
use std::collections::BTreeSet;

/// Exact equality on already-normalized values. Empty on either side scores 0.
pub fn exact(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        1.0
    } else {
        0.0
    }
}

/// Normalized Indel similarity: `1 - indel(a, b) / (len_a + len_b)`.
pub fn ratio(a: &str, b: &str) -> f64 {
    fuzz::ratio(a.chars(), b.chars())
}

/// Token-set fuzzy ratio. Returns 0 when either side has no tokens.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = sect.join(" ").chars().count();
    let sep = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    // Shared prefix contributes nothing to the Indel distance, so comparing the diffs
    // alone gives the distance of `sect+ab` vs `sect+ba`.
    let dist = indel::distance(diff_ab_joined.chars(), diff_ba_joined.chars());
    let result = 1.0 - dist as f64 / (sect_ab_len + sect_ba_len) as f64;

    if sect_len == 0 {
        return result;
    }

    // `sect` vs `sect+diff`: distance is just the appended part.
    let sect_ab_ratio = 1.0 - (sep + ab_len) as f64 / (sect_len + sect_ab_len) as f64;
    let sect_ba_ratio = 1.0 - (sep + ba_len) as f64 / (sect_len + sect_ba_len) as f64;

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}
