// src/normalize.rs
//! Address text normalization.
//!
//! Canonical form used both as parser input and for full-string fuzzy comparison:
//! - NFKC compose, lowercase
//! - diacritics stripped (NFKD + drop characters with a non-zero combining class)
//! - em/en dashes folded to `-`
//! - everything except word chars, whitespace, `,`, `/`, `-` replaced by a space
//! - comma spacing canonicalized to `", "`, whitespace collapsed, trimmed
//!
//! `normalize` is idempotent and never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::canonical_combining_class, UnicodeNormalization};

static RE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s,/\-]").expect("disallowed-chars regex"));
static RE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").expect("comma regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("non-word regex"));

/// Coarse signal of how much distinguishing content a string carries.
///
/// Ordered so `min()` across two inputs picks the less informative side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(into = "u8")]
pub enum InformationLevel {
    /// Nothing left after stripping punctuation.
    Empty = 0,
    /// A single token without digits ("korea", "porto").
    Low = 1,
    /// Has a digit, or 2–3 tokens.
    Medium = 2,
    /// Four or more tokens, no digit.
    High = 3,
}

impl From<InformationLevel> for u8 {
    fn from(level: InformationLevel) -> Self {
        level as u8
    }
}

/// Normalize raw address text. `None` and all-whitespace input map to `""`.
pub fn normalize<S: AsRef<str>>(input: Option<S>) -> String {
    match input {
        Some(s) => normalize_str(s.as_ref()),
        None => String::new(),
    }
}

/// Same as [`normalize`] for a present string.
pub fn normalize_str(input: &str) -> String {
    let s = input.trim();
    if s.is_empty() {
        return String::new();
    }

    let composed: String = s.nfkc().collect::<String>().to_lowercase();
    let mut out = strip_diacritics(&composed);

    out = out.replace(['\u{2014}', '\u{2013}'], "-");
    out = RE_DISALLOWED.replace_all(&out, " ").into_owned();
    out = RE_COMMA.replace_all(&out, ", ").into_owned();
    out = RE_WS.replace_all(&out, " ").into_owned();
    out.trim().to_string()
}

/// Decompose and drop combining marks. Scripts without decomposable forms pass through.
pub fn strip_diacritics(s: &str) -> String {
    s.nfkd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .collect()
}

/// Information level of `s` after stripping punctuation. Any digit forces `Medium`.
pub fn information_level(s: &str) -> InformationLevel {
    let s = s.trim();
    if s.is_empty() {
        return InformationLevel::Empty;
    }

    let stripped = RE_NON_WORD.replace_all(s, " ");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    let collapsed = collapsed.trim();
    if collapsed.is_empty() {
        return InformationLevel::Empty;
    }

    if collapsed.chars().any(char::is_numeric) {
        return InformationLevel::Medium;
    }

    match collapsed.split(' ').filter(|t| !t.is_empty()).count() {
        0 | 1 => InformationLevel::Low,
        2 | 3 => InformationLevel::Medium,
        _ => InformationLevel::High,
    }
}
