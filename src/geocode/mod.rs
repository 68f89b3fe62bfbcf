// src/geocode/mod.rs
//! Geocoding collaborator: free-text query → candidate full-address strings.

pub mod mapbox;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::normalize::normalize_str;

pub use mapbox::MapboxGeocoder;

pub const ENV_GEOCODER_FIXTURE_PATH: &str = "GEOCODER_FIXTURE_PATH";

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidates in provider order. Empty means "nothing found"; errors are
    /// transport/provider failures.
    async fn geocode(&self, query: &str) -> Result<Vec<String>>;
    fn name(&self) -> &'static str;
}

pub type DynGeocoder = Arc<dyn Geocoder>;

/// Fixed answers keyed by normalized query. For tests and offline batch runs.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    answers: HashMap<String, Vec<String>>,
}

impl StaticGeocoder {
    pub fn new<I, K, V>(answers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|(k, v)| (normalize_str(k.as_ref()), v.into_iter().collect()))
                .collect(),
        }
    }

    /// Load a JSON object `{ "query": ["candidate", ...] }`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading geocoder fixture from {}", path.display()))?;
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(&content)
            .with_context(|| format!("parsing geocoder fixture {}", path.display()))?;
        Ok(Self::new(raw))
    }
}

#[async_trait::async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<String>> {
        Ok(self
            .answers
            .get(&normalize_str(query))
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Always fails; stands in for an unreachable provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableGeocoder;

#[async_trait::async_trait]
impl Geocoder for UnavailableGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Vec<String>> {
        anyhow::bail!("geocoder unavailable")
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Pick a backend from the environment:
/// 1) `$GEOCODER_FIXTURE_PATH` → [`StaticGeocoder`]
/// 2) `$MAPBOX_ACCESS_TOKEN` → [`MapboxGeocoder`]
/// 3) otherwise [`UnavailableGeocoder`] (every lookup is "no candidate")
pub fn geocoder_from_env() -> Result<DynGeocoder> {
    if let Ok(p) = std::env::var(ENV_GEOCODER_FIXTURE_PATH) {
        let g = StaticGeocoder::from_json_file(Path::new(&p))?;
        tracing::info!(path = %p, "using static geocoder fixture");
        return Ok(Arc::new(g));
    }
    match MapboxGeocoder::from_env() {
        Ok(g) => Ok(Arc::new(g)),
        Err(e) => {
            tracing::warn!(error = %e, "no geocoder configured; matches will have no candidates");
            Ok(Arc::new(UnavailableGeocoder))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_geocoder_matches_normalized_query() {
        let g = StaticGeocoder::new([(
            "123 Main St.",
            vec!["123 Main Street, Springfield, Illinois 62704, United States".to_string()],
        )]);
        let got = g.geocode("  123 MAIN st ").await.unwrap();
        assert_eq!(got.len(), 1);
        assert!(g.geocode("nowhere").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_geocoder_errors() {
        assert!(UnavailableGeocoder.geocode("x").await.is_err());
    }

    #[test]
    fn fixture_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("fixture.json");
        fs::write(&p, r#"{"porto": ["Porto, Portugal"]}"#).unwrap();
        let g = StaticGeocoder::from_json_file(&p).unwrap();
        assert_eq!(g.answers.get("porto").map(Vec::len), Some(1));
    }
}
