// src/weights.rs
//! Component weights and scoring thresholds, loaded from TOML.
//!
//! ```toml
//! [weights]
//! house_number = 0.30
//! road = 0.35
//!
//! [thresholds]
//! road_noise_max_len = 3
//! ```
//!
//! All values here are empirically chosen and open to calibration. Validation happens
//! once at load time; the scoring path assumes a valid config.

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::components::ComponentLabel;

pub const DEFAULT_MATCHER_CONFIG_PATH: &str = "config/matcher.toml";
pub const ENV_MATCHER_CONFIG_PATH: &str = "ADDRESS_MATCHER_CONFIG_PATH";

/// Built-in weight table (relative discriminative power, need not sum to 1).
pub const DEFAULT_WEIGHTS: [(ComponentLabel, f64); 8] = [
    (ComponentLabel::HouseNumber, 0.30),
    (ComponentLabel::Road, 0.35),
    (ComponentLabel::Postcode, 0.15),
    (ComponentLabel::City, 0.10),
    (ComponentLabel::State, 0.05),
    (ComponentLabel::Country, 0.05),
    (ComponentLabel::House, 0.03),
    (ComponentLabel::CityDistrict, 0.02),
];

/// Label → non-negative weight. Only labels in the table are ever compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComponentWeights(BTreeMap<ComponentLabel, f64>);

impl Default for ComponentWeights {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS.into_iter().collect())
    }
}

impl ComponentWeights {
    /// Build from raw `(label, weight)` strings, rejecting unknown labels and bad weights.
    pub fn from_raw(raw: &HashMap<String, f64>) -> anyhow::Result<Self> {
        if raw.is_empty() {
            bail!("weight table is empty");
        }
        let mut out = BTreeMap::new();
        for (name, &w) in raw {
            let label: ComponentLabel = name.parse()?;
            if !w.is_finite() || w < 0.0 {
                bail!("weight for `{label}` must be a finite non-negative number, got {w}");
            }
            out.insert(label, w);
        }
        if out.values().all(|w| *w == 0.0) {
            bail!("at least one component weight must be positive");
        }
        Ok(Self(out))
    }

    pub fn get(&self, label: ComponentLabel) -> Option<f64> {
        self.0.get(&label).copied()
    }

    /// Iterate in label declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentLabel, f64)> + '_ {
        self.0.iter().map(|(l, w)| (*l, *w))
    }

    /// Sum of weights over `labels`; labels without a weight contribute 0.
    pub fn sum_over<I>(&self, labels: I) -> f64
    where
        I: IntoIterator<Item = ComponentLabel>,
    {
        labels.into_iter().filter_map(|l| self.get(l)).sum()
    }
}

fn default_road_noise_max_len() -> usize {
    3
}
fn default_postcode_fragment_min_len() -> usize {
    3
}
fn default_postcode_fragment_max_len() -> usize {
    5
}
fn default_low_info_level() -> u8 {
    1
}
fn default_w_fuzzy_low_info() -> f64 {
    0.05
}
fn default_w_fuzzy_default() -> f64 {
    0.15
}

/// Guard thresholds and blend weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Road values with this many chars or fewer are treated as parser noise.
    #[serde(default = "default_road_noise_max_len")]
    pub road_noise_max_len: usize,
    /// Pure-digit house-number tail tokens within this length range look like postcode fragments.
    #[serde(default = "default_postcode_fragment_min_len")]
    pub postcode_fragment_min_len: usize,
    #[serde(default = "default_postcode_fragment_max_len")]
    pub postcode_fragment_max_len: usize,
    /// If the less informative side is at or below this level, the low-info fuzzy weight applies.
    #[serde(default = "default_low_info_level")]
    pub low_info_level: u8,
    #[serde(default = "default_w_fuzzy_low_info")]
    pub w_fuzzy_low_info: f64,
    #[serde(default = "default_w_fuzzy_default")]
    pub w_fuzzy_default: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            road_noise_max_len: default_road_noise_max_len(),
            postcode_fragment_min_len: default_postcode_fragment_min_len(),
            postcode_fragment_max_len: default_postcode_fragment_max_len(),
            low_info_level: default_low_info_level(),
            w_fuzzy_low_info: default_w_fuzzy_low_info(),
            w_fuzzy_default: default_w_fuzzy_default(),
        }
    }
}

impl Thresholds {
    fn validate(&self) -> anyhow::Result<()> {
        for (name, w) in [
            ("w_fuzzy_low_info", self.w_fuzzy_low_info),
            ("w_fuzzy_default", self.w_fuzzy_default),
        ] {
            if !(0.0..=1.0).contains(&w) {
                bail!("thresholds.{name} must be within [0,1], got {w}");
            }
        }
        if self.postcode_fragment_min_len > self.postcode_fragment_max_len {
            bail!(
                "thresholds.postcode_fragment_min_len ({}) exceeds postcode_fragment_max_len ({})",
                self.postcode_fragment_min_len,
                self.postcode_fragment_max_len
            );
        }
        if self.low_info_level > 3 {
            bail!("thresholds.low_info_level must be 0..=3, got {}", self.low_info_level);
        }
        Ok(())
    }
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Deserialize)]
struct MatcherRoot {
    #[serde(default)]
    weights: Option<HashMap<String, f64>>,
    #[serde(default)]
    thresholds: Thresholds,
}

/// Validated scoring configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatcherConfig {
    pub weights: ComponentWeights,
    pub thresholds: Thresholds,
}

impl MatcherConfig {
    /// Load from `$ADDRESS_MATCHER_CONFIG_PATH` or `config/matcher.toml`.
    /// A missing file yields the built-in defaults; an unreadable or invalid one is an error.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = config_path_from_env();
        if !path.exists() {
            tracing::info!(path = %path.display(), "matcher config not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading matcher config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid matcher config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let root: MatcherRoot = toml::from_str(s).map_err(|e| anyhow!("toml: {e}"))?;
        let weights = match root.weights {
            Some(raw) => ComponentWeights::from_raw(&raw)?,
            None => ComponentWeights::default(),
        };
        root.thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds: root.thresholds,
        })
    }
}

/// Resolved config path (env override, else default).
pub fn config_path_from_env() -> PathBuf {
    std::env::var(ENV_MATCHER_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_MATCHER_CONFIG_PATH))
}
