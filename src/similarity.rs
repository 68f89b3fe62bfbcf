// src/similarity.rs
//! # Similarity Engine
//! Pure, testable scoring of an address pair. No I/O and no shared state; the only
//! collaborator is the (deterministic) address parser. Diagnostic logging happens in the
//! callers (`api`, `matcher`).
//!
//! Pipeline: normalize → parse → per-component weighted comparison (with noise guards)
//! → coverage penalty → blend with a full-string token-set score, down-weighted for
//! low-information inputs.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::components::{AddressComponents, ComponentLabel};
use crate::fuzzy::{exact, token_set_ratio};
use crate::normalize::{information_level, normalize_str};
use crate::parser::{AddressParser, RuleParser};
use crate::weights::{MatcherConfig, Thresholds};

/// Derived values behind the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Weighted component similarity after the coverage penalty.
    pub component_score: f64,
    /// Token-set score of the two normalized strings.
    pub full_fuzzy: f64,
    /// Blend weight given to `full_fuzzy`.
    pub w_fuzzy: f64,
    /// Scored weight over present weight.
    pub coverage_ratio: f64,
}

/// Outcome of one comparison. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    /// Final score in [0,1], rounded to 3 decimals.
    pub score: f64,
    pub components_a: AddressComponents,
    pub components_b: AddressComponents,
    /// Similarity of each component that was actually scored.
    pub per_field: BTreeMap<ComponentLabel, f64>,
    pub diagnostics: Diagnostics,
}

impl SimilarityResult {
    /// Flat view: scored labels plus `component_score`, `full_fuzzy` and `w_fuzzy`.
    pub fn breakdown(&self) -> BTreeMap<String, f64> {
        let mut out: BTreeMap<String, f64> = self
            .per_field
            .iter()
            .map(|(l, s)| (l.as_str().to_string(), *s))
            .collect();
        out.insert("component_score".into(), self.diagnostics.component_score);
        out.insert("full_fuzzy".into(), self.diagnostics.full_fuzzy);
        out.insert("w_fuzzy".into(), self.diagnostics.w_fuzzy);
        out
    }
}

/// Round to 3 decimals.
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Drop a postcode fragment the parser glued onto the house number ("202 1014" → "202").
///
/// If any token after the first is all digits (any script) with a length in
/// `[postcode_fragment_min_len, postcode_fragment_max_len]`, only the first token is kept;
/// otherwise the trimmed input is returned unchanged.
pub fn clean_house_number_with(hn: &str, t: &Thresholds) -> String {
    let hn = hn.trim();
    let toks: Vec<&str> = hn.split_whitespace().collect();
    if toks.len() <= 1 {
        return hn.to_string();
    }
    let looks_like_fragment = |tok: &str| {
        let n = tok.chars().count();
        tok.chars().all(char::is_numeric)
            && (t.postcode_fragment_min_len..=t.postcode_fragment_max_len).contains(&n)
    };
    if toks[1..].iter().any(|tok| looks_like_fragment(tok)) {
        return toks[0].to_string();
    }
    hn.to_string()
}

/// [`clean_house_number_with`] using the default thresholds.
pub fn clean_house_number(hn: &str) -> String {
    clean_house_number_with(hn, &Thresholds::default())
}

/// Stateless scorer: a parser plus a validated config. Safe to share across threads.
#[derive(Clone)]
pub struct SimilarityEngine {
    parser: Arc<dyn AddressParser>,
    config: MatcherConfig,
}

impl std::fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("parser", &self.parser.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(Arc::new(RuleParser), MatcherConfig::default())
    }
}

impl SimilarityEngine {
    pub fn new(parser: Arc<dyn AddressParser>, config: MatcherConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    /// Same engine with a different config (parser kept).
    pub fn with_config(&self, config: MatcherConfig) -> Self {
        Self {
            parser: Arc::clone(&self.parser),
            config,
        }
    }

    /// Normalize and parse one address.
    pub fn components(&self, normalized: &str) -> AddressComponents {
        if normalized.is_empty() {
            return AddressComponents::default();
        }
        AddressComponents::from_fragments(self.parser.parse(normalized))
    }

    /// Score with possibly-absent inputs; absent is treated as empty.
    pub fn score_opt(&self, a: Option<&str>, b: Option<&str>) -> SimilarityResult {
        self.score(a.unwrap_or(""), b.unwrap_or(""))
    }

    /// Score an address pair. Never fails; worst case is 0.0.
    pub fn score(&self, a: &str, b: &str) -> SimilarityResult {
        let a_norm = normalize_str(a);
        let b_norm = normalize_str(b);

        let comp_a = self.components(&a_norm);
        let comp_b = self.components(&b_norm);

        let weights = &self.config.weights;
        let t = &self.config.thresholds;

        // 1) Per-component similarity, only where both sides have a value.
        let mut per_field: BTreeMap<ComponentLabel, f64> = BTreeMap::new();
        let mut weighted_sum = 0.0;
        let mut considered_weight = 0.0;

        for (label, w) in weights.iter() {
            let (Some(va), Some(vb)) = (comp_a.get(label), comp_b.get(label)) else {
                continue;
            };

            let s = match label {
                ComponentLabel::HouseNumber => {
                    let ca = clean_house_number_with(va, t);
                    let cb = clean_house_number_with(vb, t);
                    let s = exact(&ca, &cb);
                    if s == 0.0 {
                        // "12-A" vs "12A"
                        s.max(token_set_ratio(&ca, &cb))
                    } else {
                        s
                    }
                }
                ComponentLabel::Road => {
                    if is_noise_road(va, t) || is_noise_road(vb, t) {
                        continue;
                    }
                    token_set_ratio(va, vb)
                }
                ComponentLabel::Postcode => exact(va, vb),
                _ => token_set_ratio(va, vb),
            };

            per_field.insert(label, round3(s));
            weighted_sum += w * s;
            considered_weight += w;
        }

        let component_similarity = if considered_weight > 0.0 {
            weighted_sum / considered_weight
        } else {
            0.0
        };

        // 2) Coverage: scored weight over the weight of labels present on either side.
        let union: BTreeSet<ComponentLabel> = weights
            .iter()
            .map(|(l, _)| l)
            .filter(|l| comp_a.contains(*l) || comp_b.contains(*l))
            .collect();
        let union_weight = weights.sum_over(union.iter().copied());
        let scored_weight = weights.sum_over(per_field.keys().copied());
        let coverage_ratio = if union_weight > 0.0 {
            scored_weight / union_weight
        } else {
            0.0
        };
        let component_score = component_similarity * coverage_ratio;

        // 3) Full-string fallback, shrunk for low-information inputs.
        let full_fuzzy = token_set_ratio(&a_norm, &b_norm);
        let min_level = information_level(&a_norm).min(information_level(&b_norm));
        let w_fuzzy = if (min_level as u8) <= t.low_info_level {
            t.w_fuzzy_low_info
        } else {
            t.w_fuzzy_default
        };

        let final_score = (1.0 - w_fuzzy) * component_score + w_fuzzy * full_fuzzy;

        SimilarityResult {
            score: round3(final_score),
            components_a: comp_a,
            components_b: comp_b,
            per_field,
            diagnostics: Diagnostics {
                component_score: round3(component_score),
                full_fuzzy: round3(full_fuzzy),
                w_fuzzy: round3(w_fuzzy),
                coverage_ratio: round3(coverage_ratio),
            },
        }
    }
}

/// Very short road values are usually a stray postcode fragment, not a road.
fn is_noise_road(v: &str, t: &Thresholds) -> bool {
    let v = v.trim();
    v.is_empty() || v.chars().count() <= t.road_noise_max_len
}
