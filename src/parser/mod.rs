// src/parser/mod.rs
//! Address parser collaborator.
//!
//! The engine only needs `parse(normalized_text) -> [(value, label)]`. Any backend works
//! (rule table, statistical model, remote service) as long as it is deterministic:
//! the same input must always produce the same fragments. A non-deterministic parser
//! breaks the identity (`score(s, s) == 1`) and symmetry properties of the engine.

pub mod rules;

use crate::components::ParsedFragment;

pub use rules::RuleParser;

/// Deterministic address parser. Must not panic for any normalized string;
/// empty input may return an empty sequence.
pub trait AddressParser: Send + Sync {
    fn parse(&self, normalized: &str) -> Vec<ParsedFragment>;

    /// Backend name for diagnostics.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Closures work as parsers, handy for fixtures.
impl<F> AddressParser for F
where
    F: Fn(&str) -> Vec<ParsedFragment> + Send + Sync,
{
    fn parse(&self, normalized: &str) -> Vec<ParsedFragment> {
        self(normalized)
    }
}
