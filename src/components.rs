// src/components.rs
//! Address component labels and the per-address component map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Structural label emitted by an address parser.
///
/// Declaration order is the iteration order of weight tables and component maps,
/// so the default-weighted labels come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentLabel {
    HouseNumber,
    Road,
    Postcode,
    City,
    State,
    Country,
    House,
    CityDistrict,
    Category,
    Near,
    Unit,
    Level,
    Staircase,
    Entrance,
    PoBox,
    Suburb,
    Island,
    StateDistrict,
    CountryRegion,
    WorldRegion,
}

impl ComponentLabel {
    pub const ALL: [ComponentLabel; 20] = [
        Self::HouseNumber,
        Self::Road,
        Self::Postcode,
        Self::City,
        Self::State,
        Self::Country,
        Self::House,
        Self::CityDistrict,
        Self::Category,
        Self::Near,
        Self::Unit,
        Self::Level,
        Self::Staircase,
        Self::Entrance,
        Self::PoBox,
        Self::Suburb,
        Self::Island,
        Self::StateDistrict,
        Self::CountryRegion,
        Self::WorldRegion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HouseNumber => "house_number",
            Self::Road => "road",
            Self::Postcode => "postcode",
            Self::City => "city",
            Self::State => "state",
            Self::Country => "country",
            Self::House => "house",
            Self::CityDistrict => "city_district",
            Self::Category => "category",
            Self::Near => "near",
            Self::Unit => "unit",
            Self::Level => "level",
            Self::Staircase => "staircase",
            Self::Entrance => "entrance",
            Self::PoBox => "po_box",
            Self::Suburb => "suburb",
            Self::Island => "island",
            Self::StateDistrict => "state_district",
            Self::CountryRegion => "country_region",
            Self::WorldRegion => "world_region",
        }
    }
}

impl fmt::Display for ComponentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == key)
            .ok_or_else(|| anyhow::anyhow!("unknown address component label `{s}`"))
    }
}

/// One `(value, label)` pair as emitted by a parser, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFragment {
    pub value: String,
    pub label: ComponentLabel,
}

impl ParsedFragment {
    pub fn new(value: impl Into<String>, label: ComponentLabel) -> Self {
        Self {
            value: value.into(),
            label,
        }
    }
}

/// Label → joined value. Every present entry is a non-empty trimmed string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressComponents(BTreeMap<ComponentLabel, String>);

impl AddressComponents {
    /// Fold parser fragments: same-label values are space-joined in emission order,
    /// blank fragments are dropped.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = ParsedFragment>,
    {
        let mut parts: BTreeMap<ComponentLabel, Vec<String>> = BTreeMap::new();
        for frag in fragments {
            let v = frag.value.trim();
            if v.is_empty() {
                continue;
            }
            parts.entry(frag.label).or_default().push(v.to_string());
        }
        Self(
            parts
                .into_iter()
                .map(|(label, vals)| (label, vals.join(" ")))
                .collect(),
        )
    }

    /// Value for `label`, if present.
    pub fn get(&self, label: ComponentLabel) -> Option<&str> {
        self.0.get(&label).map(String::as_str)
    }

    pub fn contains(&self, label: ComponentLabel) -> bool {
        self.0.contains_key(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentLabel, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}
