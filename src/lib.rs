// src/lib.rs
// Public library surface for the service, the batch binary and integration tests.

pub mod components;
pub mod fuzzy;
pub mod normalize;
pub mod parser;
pub mod similarity;
pub mod weights;

pub mod batch;
pub mod geocode;
pub mod matcher;

pub mod api;
pub mod debug;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::components::{AddressComponents, ComponentLabel, ParsedFragment};
pub use crate::matcher::{best_match, AddressMatcher, MatchOutcome, MatcherHandle};
pub use crate::normalize::{information_level, normalize, normalize_str, InformationLevel};
pub use crate::parser::{AddressParser, RuleParser};
pub use crate::similarity::{Diagnostics, SimilarityEngine, SimilarityResult};
pub use crate::weights::{ComponentWeights, MatcherConfig, Thresholds};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a compact `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
